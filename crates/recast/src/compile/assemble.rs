// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Code Assembler: combines per-field plans into a record codec.

use super::dispatch::FieldCompiler;
use super::plan::{DecodePlan, EncodePlan};
use crate::config::{Dialect, Options};
use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::native::{Instance, Native};
use crate::registry::RegistryInner;
use crate::schema::ClassSchema;
use crate::types::FieldDefault;
use crate::value::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
struct CompiledField {
    name: String,
    type_name: String,
    default: FieldDefault,
    encode: EncodePlan,
    decode: DecodePlan,
}

/// Compiled encode/decode routines of one record type under one dialect.
///
/// Immutable once built; shared through the registry.
#[derive(Debug)]
pub struct RecordCodec {
    record: Arc<str>,
    dialect: Dialect,
    fields: Vec<CompiledField>,
}

pub(crate) fn compile_record(
    registry: &Arc<RegistryInner>,
    name: &str,
    dialect: &Dialect,
) -> Result<RecordCodec, SchemaError> {
    let chain = registry.chain(name)?;
    let schema = ClassSchema::resolve(&chain)?;

    let mut fields = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let compiler = FieldCompiler::new(registry, dialect, &schema.record, field);
        fields.push(CompiledField {
            name: field.name.clone(),
            type_name: field.ty.to_string(),
            default: field.default.clone(),
            encode: compiler.encode_plan(&field.ty)?,
            decode: compiler.decode_plan(&field.ty)?,
        });
    }

    Ok(RecordCodec {
        record: schema.record,
        dialect: dialect.clone(),
        fields,
    })
}

impl RecordCodec {
    /// Record type this codec converts.
    pub fn record(&self) -> &str {
        &self.record
    }

    pub(crate) fn record_arc(&self) -> &Arc<str> {
        &self.record
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Field names in encoding order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Encode `instance` into an ordered string-keyed map.
    pub fn to_generic(&self, instance: &Instance, opts: Options) -> Result<Value, EncodeError> {
        if instance.record() != &*self.record {
            return Err(EncodeError::WrongRecordType {
                expected: self.record.to_string(),
                found: instance.record().to_string(),
            });
        }

        let mut out = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = instance
                .get(&field.name)
                .ok_or_else(|| EncodeError::MissingAttribute {
                    field: field.name.clone(),
                    record: self.record.to_string(),
                })?;
            if value.is_null() {
                if !opts.omit_none {
                    out.insert(field.name.clone(), Value::Null);
                }
                continue;
            }
            let encoded = field
                .encode
                .encode(value, &opts)
                .map_err(|source| EncodeError::InvalidValue {
                    field: field.name.clone(),
                    record: self.record.to_string(),
                    source,
                })?;
            out.insert(field.name.clone(), encoded);
        }
        Ok(Value::Map(out))
    }

    /// Decode a generic tree into an instance.
    ///
    /// Keys the record type does not declare are ignored.
    pub fn from_generic(&self, tree: &Value, opts: Options) -> Result<Instance, DecodeError> {
        let Value::Map(map) = tree else {
            return Err(DecodeError::ArgumentShape {
                record: self.record.to_string(),
                found: tree.kind_name(),
            });
        };

        let mut instance = Instance::new(Arc::clone(&self.record));
        for field in &self.fields {
            let value = match map.get(&field.name) {
                None => self.default_for(field)?,
                Some(Value::Null) => Native::Null,
                Some(raw) => field
                    .decode
                    .decode(raw, &opts)
                    .map_err(|source| DecodeError::InvalidFieldValue {
                        field: field.name.clone(),
                        type_name: field.type_name.clone(),
                        value: raw.clone(),
                        record: self.record.to_string(),
                        source,
                    })?,
            };
            instance.set(field.name.clone(), value);
        }
        Ok(instance)
    }

    /// Construct an instance from field values, filling defaults.
    pub fn instantiate<I, K>(&self, fields: I) -> Result<Instance, DecodeError>
    where
        I: IntoIterator<Item = (K, Native)>,
        K: Into<String>,
    {
        let mut given: Vec<(String, Native)> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        if let Some((unknown, _)) = given
            .iter()
            .find(|(name, _)| !self.fields.iter().any(|f| &f.name == name))
        {
            return Err(DecodeError::UnknownField {
                field: unknown.clone(),
                record: self.record.to_string(),
            });
        }

        let mut instance = Instance::new(Arc::clone(&self.record));
        for field in &self.fields {
            let value = match given.iter().position(|(name, _)| name == &field.name) {
                Some(pos) => given.swap_remove(pos).1,
                None => self.default_for(field)?,
            };
            instance.set(field.name.clone(), value);
        }
        Ok(instance)
    }

    fn default_for(&self, field: &CompiledField) -> Result<Native, DecodeError> {
        field.default.produce().ok_or_else(|| DecodeError::MissingField {
            field: field.name.clone(),
            type_name: field.type_name.clone(),
            record: self.record.to_string(),
        })
    }
}
