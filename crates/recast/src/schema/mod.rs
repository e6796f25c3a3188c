// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type Resolver.
//!
//! Flattens a record type and its base chain into the ordered field list
//! that gets compiled. Rules:
//!
//! - base fields come first, oldest base first;
//! - a redeclared field replaces the inherited one in place, so it keeps the
//!   base position but takes the new type and default;
//! - class-level and constructor-only declarations are not fields;
//! - metadata is taken only from fields declared on the compiled type itself.

use crate::error::SchemaError;
use crate::types::{FieldDefault, FieldMarker, Metadata, RecordType, TypeDescriptor};
use std::sync::Arc;

/// A resolved field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default: FieldDefault,
    pub metadata: Metadata,
    /// Record type whose declaration won.
    pub declared_on: Arc<str>,
}

/// The resolved field list of a record type.
#[derive(Debug, Clone)]
pub struct ClassSchema {
    pub record: Arc<str>,
    pub fields: Vec<FieldSchema>,
}

impl ClassSchema {
    /// Resolve from a base chain ordered oldest first; the last entry is the
    /// record type being compiled.
    pub fn resolve(chain: &[Arc<RecordType>]) -> Result<Self, SchemaError> {
        let target = chain
            .last()
            .ok_or_else(|| SchemaError::UnresolvedType {
                name: String::new(),
                referenced_by: None,
            })?;

        let mut fields: Vec<FieldSchema> = Vec::new();
        for record in chain {
            let own = Arc::ptr_eq(record, target);
            for decl in record.own_fields() {
                if decl.marker != FieldMarker::Regular {
                    continue;
                }
                let resolved = FieldSchema {
                    name: decl.name.clone(),
                    ty: decl.ty.clone(),
                    default: decl.default.clone(),
                    metadata: if own {
                        decl.metadata.clone()
                    } else {
                        Metadata::new()
                    },
                    declared_on: Arc::clone(record.name_arc()),
                };
                match fields.iter_mut().find(|f| f.name == decl.name) {
                    Some(slot) => *slot = resolved,
                    None => fields.push(resolved),
                }
            }
        }

        Ok(Self {
            record: Arc::clone(target.name_arc()),
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}
