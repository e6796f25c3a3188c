// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch Engine: turns one field's type descriptor into plans.

use super::discriminator::{Discriminator, PolyEncoder};
use super::plan::{DecodePlan, EncodePlan, KeyHint, KeyPlan, TemporalParser};
use crate::config::{Dialect, NativeKind, META_DESERIALIZE, PARSER_RFC2822, PARSER_RFC3339};
use crate::error::SchemaError;
use crate::registry::RegistryInner;
use crate::schema::FieldSchema;
use crate::types::{MetaValue, PrimitiveKind, TemporalKind, TypeDescriptor};
use crate::value::Value;
use std::sync::Arc;

/// Compiles the descriptors of a single field.
///
/// Every error names the field, its declared type and the owning record.
pub(crate) struct FieldCompiler<'a> {
    registry: &'a Arc<RegistryInner>,
    dialect: &'a Dialect,
    record: &'a str,
    field: &'a FieldSchema,
}

impl<'a> FieldCompiler<'a> {
    pub(crate) fn new(
        registry: &'a Arc<RegistryInner>,
        dialect: &'a Dialect,
        record: &'a str,
        field: &'a FieldSchema,
    ) -> Self {
        Self {
            registry,
            dialect,
            record,
            field,
        }
    }

    pub(crate) fn encode_plan(&self, ty: &TypeDescriptor) -> Result<EncodePlan, SchemaError> {
        let plan = match ty {
            TypeDescriptor::Primitive(kind) => match kind {
                PrimitiveKind::Int => EncodePlan::Int,
                PrimitiveKind::Float => EncodePlan::Float,
                PrimitiveKind::Bool => EncodePlan::Bool,
                PrimitiveKind::Str => EncodePlan::Str,
                PrimitiveKind::Bytes | PrimitiveKind::ByteArray => EncodePlan::Bytes,
                PrimitiveKind::NoneType => EncodePlan::NoneType,
            },
            TypeDescriptor::Optional(inner) => EncodePlan::Optional(Box::new(self.encode_plan(inner)?)),
            TypeDescriptor::Union(arms) => match (ty.optional_inner(), arms.as_slice()) {
                (Some(inner), _) => EncodePlan::Optional(Box::new(self.encode_plan(inner)?)),
                (None, [single]) => self.encode_plan(single)?,
                _ => return Err(self.unsupported_union()),
            },
            TypeDescriptor::Sequence(_, inner) => EncodePlan::Sequence(Box::new(self.encode_plan(inner)?)),
            TypeDescriptor::Mapping(key, value) => {
                self.check_key(key)?;
                EncodePlan::Mapping {
                    key: Box::new(self.encode_plan(key)?),
                    value: Box::new(self.encode_plan(value)?),
                }
            }
            TypeDescriptor::ChainMap(key, value) => {
                self.check_key(key)?;
                EncodePlan::ChainMap {
                    key: Box::new(self.encode_plan(key)?),
                    value: Box::new(self.encode_plan(value)?),
                }
            }
            TypeDescriptor::Literal(values) => EncodePlan::Literal(values.clone()),
            TypeDescriptor::Enum(e) => EncodePlan::Enum(Arc::clone(e)),
            TypeDescriptor::Path(_) => EncodePlan::Path,
            TypeDescriptor::Temporal(kind) => {
                if self.dialect.serializes_natively(native_kind(*kind)) {
                    EncodePlan::Identity
                } else {
                    EncodePlan::Temporal(*kind)
                }
            }
            TypeDescriptor::Duration => EncodePlan::Duration,
            TypeDescriptor::Timezone => EncodePlan::Timezone,
            TypeDescriptor::Uuid => {
                if self.dialect.serializes_natively(NativeKind::Uuid) {
                    EncodePlan::Identity
                } else {
                    EncodePlan::Uuid
                }
            }
            TypeDescriptor::Decimal => EncodePlan::Decimal,
            TypeDescriptor::Rational => EncodePlan::Rational,
            TypeDescriptor::Record(name) => {
                EncodePlan::Record(self.registry.link(name, self.dialect, self.record)?)
            }
            TypeDescriptor::Polymorphic(base, spec) => {
                self.check_discriminator(spec.include_subtypes, spec.include_supertypes)?;
                EncodePlan::Polymorphic(PolyEncoder::compile(
                    self.registry,
                    self.dialect,
                    self.record,
                    base,
                )?)
            }
            TypeDescriptor::Strategy(s) => EncodePlan::Strategy(Arc::clone(s)),
            TypeDescriptor::Protocol(p) => EncodePlan::Protocol(Arc::clone(p)),
            TypeDescriptor::Any => EncodePlan::Identity,
            TypeDescriptor::TypeVar(_) | TypeDescriptor::AnyStr | TypeDescriptor::Bare(_) => {
                return Err(self.unsupported_shape(ty))
            }
        };
        Ok(plan)
    }

    pub(crate) fn decode_plan(&self, ty: &TypeDescriptor) -> Result<DecodePlan, SchemaError> {
        let plan = match ty {
            TypeDescriptor::Primitive(kind) => match kind {
                PrimitiveKind::Int => DecodePlan::Int,
                PrimitiveKind::Float => DecodePlan::Float,
                PrimitiveKind::Bool => DecodePlan::Bool,
                PrimitiveKind::Str => DecodePlan::Str,
                PrimitiveKind::Bytes | PrimitiveKind::ByteArray => DecodePlan::Bytes,
                PrimitiveKind::NoneType => DecodePlan::NoneType,
            },
            TypeDescriptor::Optional(inner) => DecodePlan::Optional(Box::new(self.decode_plan(inner)?)),
            TypeDescriptor::Union(arms) => match (ty.optional_inner(), arms.as_slice()) {
                (Some(inner), _) => DecodePlan::Optional(Box::new(self.decode_plan(inner)?)),
                (None, [single]) => self.decode_plan(single)?,
                _ => return Err(self.unsupported_union()),
            },
            TypeDescriptor::Sequence(kind, inner) => {
                let inner = Box::new(self.decode_plan(inner)?);
                if kind.is_set() {
                    DecodePlan::Set(inner)
                } else {
                    DecodePlan::Sequence(inner)
                }
            }
            TypeDescriptor::Mapping(key, value) => DecodePlan::Mapping {
                key: self.key_plan(key)?,
                value: Box::new(self.decode_plan(value)?),
            },
            TypeDescriptor::ChainMap(key, value) => DecodePlan::ChainMap {
                key: self.key_plan(key)?,
                value: Box::new(self.decode_plan(value)?),
            },
            TypeDescriptor::Literal(values) => DecodePlan::Literal(values.clone()),
            TypeDescriptor::Enum(e) => DecodePlan::Enum(Arc::clone(e)),
            TypeDescriptor::Path(flavor) => DecodePlan::Path(flavor.concrete()),
            TypeDescriptor::Temporal(kind) => {
                if self.dialect.deserializes_natively(native_kind(*kind)) {
                    DecodePlan::Identity
                } else {
                    DecodePlan::Temporal {
                        kind: *kind,
                        parser: self.temporal_parser()?,
                    }
                }
            }
            TypeDescriptor::Duration => DecodePlan::Duration,
            TypeDescriptor::Timezone => DecodePlan::Timezone,
            TypeDescriptor::Uuid => {
                if self.dialect.deserializes_natively(NativeKind::Uuid) {
                    DecodePlan::Identity
                } else {
                    DecodePlan::Uuid
                }
            }
            TypeDescriptor::Decimal => DecodePlan::Decimal,
            TypeDescriptor::Rational => DecodePlan::Rational,
            TypeDescriptor::Record(name) => {
                DecodePlan::Record(self.registry.link(name, self.dialect, self.record)?)
            }
            TypeDescriptor::Polymorphic(base, spec) => {
                self.check_discriminator(spec.include_subtypes, spec.include_supertypes)?;
                DecodePlan::Polymorphic(Discriminator::compile(
                    self.registry,
                    self.dialect,
                    self.record,
                    base,
                    spec,
                )?)
            }
            TypeDescriptor::Strategy(s) => DecodePlan::Strategy(Arc::clone(s)),
            TypeDescriptor::Protocol(p) => DecodePlan::Protocol(Arc::clone(p)),
            TypeDescriptor::Any => DecodePlan::Identity,
            TypeDescriptor::TypeVar(_) | TypeDescriptor::AnyStr | TypeDescriptor::Bare(_) => {
                return Err(self.unsupported_shape(ty))
            }
        };
        Ok(plan)
    }

    // ------------------------------------------------------------------------
    // Map keys
    // ------------------------------------------------------------------------

    fn check_key(&self, key: &TypeDescriptor) -> Result<(), SchemaError> {
        match key {
            TypeDescriptor::Record(_) | TypeDescriptor::Polymorphic(..) => {
                Err(self.unserializable(format!("{} can not be used as a mapping key", key)))
            }
            other => match other.optional_inner() {
                Some(inner) => self.check_key(inner),
                None => Ok(()),
            },
        }
    }

    fn key_plan(&self, key: &TypeDescriptor) -> Result<KeyPlan, SchemaError> {
        self.check_key(key)?;
        Ok(KeyPlan {
            hint: key_hint(key),
            plan: Box::new(self.decode_plan(key)?),
        })
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    fn temporal_parser(&self) -> Result<Option<TemporalParser>, SchemaError> {
        let Some(meta) = self.field.metadata.get(META_DESERIALIZE) else {
            return Ok(None);
        };
        match meta {
            MetaValue::Parser(parse) => Ok(Some(TemporalParser::Custom(Arc::clone(parse)))),
            MetaValue::Text(name) if name == PARSER_RFC3339 => Ok(Some(TemporalParser::Rfc3339)),
            MetaValue::Text(name) if name == PARSER_RFC2822 => Ok(Some(TemporalParser::Rfc2822)),
            MetaValue::Text(name) => Err(self.unserializable(format!(
                "unsupported deserialization engine \"{}\"",
                name
            ))),
            other => Err(self.unserializable(format!(
                "unsupported \"{}\" option {:?}",
                META_DESERIALIZE, other
            ))),
        }
    }

    // ------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------

    fn check_discriminator(&self, subtypes: bool, supertypes: bool) -> Result<(), SchemaError> {
        if subtypes || supertypes {
            Ok(())
        } else {
            Err(self.unserializable(
                "either include_subtypes or include_supertypes must be enabled".to_string(),
            ))
        }
    }

    fn unsupported_union(&self) -> SchemaError {
        self.unserializable("only Optional[T] unions are supported".to_string())
    }

    fn unsupported_shape(&self, ty: &TypeDescriptor) -> SchemaError {
        let note = match ty {
            TypeDescriptor::TypeVar(name) => format!("type variable {} is not bound", name),
            TypeDescriptor::AnyStr => "AnyStr is not supported, use str or bytes".to_string(),
            TypeDescriptor::Bare(kind) => format!("Use {} instead", kind.hint()),
            other => format!("{} is not supported", other),
        };
        self.unserializable(note)
    }

    fn unserializable(&self, note: String) -> SchemaError {
        SchemaError::UnserializableField {
            field: self.field.name.clone(),
            type_name: self.field.ty.to_string(),
            record: self.record.to_string(),
            note: Some(note),
        }
    }
}

fn native_kind(kind: TemporalKind) -> NativeKind {
    match kind {
        TemporalKind::Date => NativeKind::Date,
        TemporalKind::Time => NativeKind::Time,
        TemporalKind::DateTime => NativeKind::DateTime,
    }
}

fn key_hint(key: &TypeDescriptor) -> KeyHint {
    match key {
        TypeDescriptor::Primitive(PrimitiveKind::Int) => KeyHint::Int,
        TypeDescriptor::Primitive(PrimitiveKind::Float) => KeyHint::Float,
        TypeDescriptor::Primitive(PrimitiveKind::Bool) => KeyHint::Bool,
        TypeDescriptor::Enum(e) if e.is_integral() => KeyHint::Int,
        TypeDescriptor::Literal(values)
            if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Int(_))) =>
        {
            KeyHint::Int
        }
        other => match other.optional_inner() {
            Some(inner) => key_hint(inner),
            None => KeyHint::Text,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_hints() {
        assert_eq!(key_hint(&TypeDescriptor::int()), KeyHint::Int);
        assert_eq!(key_hint(&TypeDescriptor::str()), KeyHint::Text);
        assert_eq!(
            key_hint(&TypeDescriptor::optional(TypeDescriptor::bool())),
            KeyHint::Bool
        );
        assert_eq!(key_hint(&TypeDescriptor::literal([1, 2])), KeyHint::Int);
        assert_eq!(key_hint(&TypeDescriptor::literal(["a"])), KeyHint::Text);
        assert_eq!(key_hint(&TypeDescriptor::Uuid), KeyHint::Text);
    }
}
