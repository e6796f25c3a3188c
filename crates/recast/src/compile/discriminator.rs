// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discriminator Resolver.
//!
//! Compiles the polymorphic conversions of a field typed as a base record
//! type. Decoding picks among candidate record types either by trial
//! (structural mode) or by the value of a tag field (tag mode); encoding
//! follows the instance's own record type.
//!
//! Candidate order: descendants of the base, deepest first and in
//! declaration order within a depth, then the base itself.

use crate::config::{Dialect, Options};
use crate::error::{ConvertError, SchemaError};
use crate::native::Native;
use crate::registry::{Link, RegistryInner};
use crate::types::{DiscriminatorSpec, RecordType};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Hashable form of a tag value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TagKey {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl TagKey {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Str(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Mode {
    Structural(Vec<Link>),
    Tagged {
        field: String,
        variants: HashMap<TagKey, Link>,
    },
}

/// Compiled polymorphic decoder.
#[derive(Debug)]
pub(crate) struct Discriminator {
    base: Arc<str>,
    mode: Mode,
}

impl Discriminator {
    pub(crate) fn compile(
        registry: &Arc<RegistryInner>,
        dialect: &Dialect,
        owner: &str,
        base: &Arc<str>,
        spec: &DiscriminatorSpec,
    ) -> Result<Self, SchemaError> {
        let candidates = candidates(registry, owner, base, spec)?;

        let mode = match &spec.field {
            None => Mode::Structural(
                candidates
                    .iter()
                    .map(|rt| registry.link(rt.name(), dialect, owner))
                    .collect::<Result<_, _>>()?,
            ),
            Some(field) => {
                let mut variants = HashMap::with_capacity(candidates.len());
                for rt in &candidates {
                    let tag = match &spec.tagger {
                        Some(tagger) => Some(tagger(&**rt)),
                        None => rt.own_tag(field),
                    };
                    let Some(key) = tag.as_ref().and_then(TagKey::from_value) else {
                        log::trace!(
                            "[Discriminator::compile] {} declares no usable tag for \"{}\"",
                            rt.name(),
                            field
                        );
                        continue;
                    };
                    if variants.contains_key(&key) {
                        continue;
                    }
                    variants.insert(key, registry.link(rt.name(), dialect, owner)?);
                }
                Mode::Tagged {
                    field: field.clone(),
                    variants,
                }
            }
        };

        log::debug!(
            "[Discriminator::compile] {}.{}: {} candidate(s), {}",
            owner,
            base,
            candidates.len(),
            if spec.is_structural() { "structural" } else { "tagged" }
        );

        Ok(Self {
            base: Arc::clone(base),
            mode,
        })
    }

    pub(crate) fn decode(&self, value: &Value, opts: &Options) -> Result<Native, ConvertError> {
        match &self.mode {
            Mode::Structural(candidates) => {
                for link in candidates {
                    let attempt = link
                        .get()
                        .and_then(|codec| codec.from_generic(value, *opts).map_err(Into::into));
                    match attempt {
                        Ok(instance) => return Ok(Native::Record(instance)),
                        Err(e) => log::trace!(
                            "[Discriminator::decode] {} rejected as {}: {}",
                            link.record(),
                            self.base,
                            e
                        ),
                    }
                }
                Err(ConvertError::NoMatchingVariant {
                    base: self.base.to_string(),
                    tried: candidates.len(),
                })
            }
            Mode::Tagged { field, variants } => {
                let Value::Map(map) = value else {
                    return Err(ConvertError::Expected {
                        expected: "map",
                        found: value.kind_name(),
                    });
                };
                let tag = map.get(field).ok_or_else(|| ConvertError::MissingTag {
                    field: field.clone(),
                })?;
                let link = TagKey::from_value(tag)
                    .and_then(|key| variants.get(&key))
                    .ok_or_else(|| ConvertError::UnknownTag {
                        field: field.clone(),
                        tag: tag.clone(),
                    })?;
                Ok(Native::Record(link.get()?.from_generic(value, *opts)?))
            }
        }
    }
}

fn candidates(
    registry: &Arc<RegistryInner>,
    owner: &str,
    base: &Arc<str>,
    spec: &DiscriminatorSpec,
) -> Result<Vec<Arc<RecordType>>, SchemaError> {
    let declared = registry
        .record_type(base)
        .ok_or_else(|| SchemaError::UnresolvedType {
            name: base.to_string(),
            referenced_by: Some(owner.to_string()),
        })?;

    let mut out = Vec::new();
    if spec.include_subtypes {
        out.extend(registry.descendants(base));
    }
    if spec.include_supertypes {
        out.push(declared);
    }
    Ok(out)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a base-typed field through the instance's own record type.
#[derive(Debug)]
pub(crate) struct PolyEncoder {
    base: Arc<str>,
    variants: HashMap<Arc<str>, Link>,
}

impl PolyEncoder {
    pub(crate) fn compile(
        registry: &Arc<RegistryInner>,
        dialect: &Dialect,
        owner: &str,
        base: &Arc<str>,
    ) -> Result<Self, SchemaError> {
        let mut variants = HashMap::new();
        variants.insert(Arc::clone(base), registry.link(base, dialect, owner)?);
        for rt in registry.descendants(base) {
            variants.insert(Arc::clone(rt.name_arc()), registry.link(rt.name(), dialect, owner)?);
        }
        Ok(Self {
            base: Arc::clone(base),
            variants,
        })
    }

    pub(crate) fn encode(&self, value: &Native, opts: &Options) -> Result<Value, ConvertError> {
        let Native::Record(instance) = value else {
            return Err(ConvertError::Expected {
                expected: "record",
                found: value.kind_name(),
            });
        };
        let link = self
            .variants
            .get(instance.record())
            .ok_or_else(|| ConvertError::NotASubtype {
                base: self.base.to_string(),
                found: instance.record().to_string(),
            })?;
        Ok(link.get()?.to_generic(instance, *opts)?)
    }
}
