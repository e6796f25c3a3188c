// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record type declarations.

use super::descriptor::TypeDescriptor;
use super::strategy::HookError;
use crate::native::Native;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Parser for date/time text named in field metadata.
pub type DateParser = Arc<dyn Fn(&str) -> Result<Native, HookError> + Send + Sync>;

/// Produces the discriminator tag of a candidate record type.
pub type Tagger = Arc<dyn Fn(&RecordType) -> Value + Send + Sync>;

/// Zero-argument default factory.
pub type Factory = Arc<dyn Fn() -> Native + Send + Sync>;

// ============================================================================
// Fields
// ============================================================================

/// What the constructor supplies when a field is absent.
#[derive(Clone)]
pub enum FieldDefault {
    Required,
    Value(Native),
    Factory(Factory),
}

impl FieldDefault {
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// Materialise the default.
    pub fn produce(&self) -> Option<Native> {
        match self {
            Self::Required => None,
            Self::Value(v) => Some(v.clone()),
            Self::Factory(f) => Some(f()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("Required"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Declarations that are not instance fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldMarker {
    #[default]
    Regular,
    /// Class-level attribute.
    ClassVar,
    /// Constructor-only argument.
    InitVar,
}

/// A metadata entry.
#[derive(Clone)]
pub enum MetaValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Parser(DateParser),
}

impl fmt::Debug for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Parser(_) => f.write_str("Parser(..)"),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

/// Opaque per-field metadata.
pub type Metadata = IndexMap<String, MetaValue>;

/// A field as declared on one record type.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default: FieldDefault,
    pub metadata: Metadata,
    pub marker: FieldMarker,
}

impl FieldDecl {
    /// A required field.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            default: FieldDefault::Required,
            metadata: Metadata::new(),
            marker: FieldMarker::Regular,
        }
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<Native>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    #[must_use]
    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Native + Send + Sync + 'static,
    {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a date/time parser under `key`.
    #[must_use]
    pub fn meta_parser<F>(mut self, key: impl Into<String>, parser: F) -> Self
    where
        F: Fn(&str) -> Result<Native, HookError> + Send + Sync + 'static,
    {
        self.metadata
            .insert(key.into(), MetaValue::Parser(Arc::new(parser)));
        self
    }

    #[must_use]
    pub fn class_var(mut self) -> Self {
        self.marker = FieldMarker::ClassVar;
        self
    }

    #[must_use]
    pub fn init_var(mut self) -> Self {
        self.marker = FieldMarker::InitVar;
        self
    }
}

// ============================================================================
// Discriminators
// ============================================================================

/// Polymorphic decode policy for a field typed as a base record type.
///
/// Without a tag field, candidates are tried structurally: subtypes deepest
/// first, then the declared type itself when `include_supertypes` is set.
/// With a tag field, the input's tag selects exactly one candidate.
///
/// `include_supertypes` admits the declared type only; its own ancestors
/// are never candidates since their instances would not fit the field.
#[derive(Clone, Default)]
pub struct DiscriminatorSpec {
    pub field: Option<String>,
    pub include_subtypes: bool,
    pub include_supertypes: bool,
    pub tagger: Option<Tagger>,
}

impl DiscriminatorSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch on the value of `field`.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn include_subtypes(mut self) -> Self {
        self.include_subtypes = true;
        self
    }

    #[must_use]
    pub fn include_supertypes(mut self) -> Self {
        self.include_supertypes = true;
        self
    }

    /// Compute candidate tags with `tagger` instead of declared tags.
    #[must_use]
    pub fn tagger<F>(mut self, tagger: F) -> Self
    where
        F: Fn(&RecordType) -> Value + Send + Sync + 'static,
    {
        self.tagger = Some(Arc::new(tagger));
        self
    }

    pub fn is_structural(&self) -> bool {
        self.field.is_none()
    }
}

impl fmt::Debug for DiscriminatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscriminatorSpec")
            .field("field", &self.field)
            .field("include_subtypes", &self.include_subtypes)
            .field("include_supertypes", &self.include_supertypes)
            .field("tagger", &self.tagger.as_ref().map(|_| ".."))
            .finish()
    }
}

// ============================================================================
// Record types
// ============================================================================

/// A declared record type.
#[derive(Debug, Clone)]
pub struct RecordType {
    name: Arc<str>,
    base: Option<Arc<str>>,
    fields: Vec<FieldDecl>,
    constants: IndexMap<String, Value>,
}

impl RecordType {
    pub fn builder(name: impl Into<Arc<str>>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Fields declared directly on this type, in declaration order.
    pub fn own_fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Class-level constant declared directly on this type.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// The discriminator tag this type declares for `field`, if any.
    ///
    /// A class-level constant wins; otherwise a literal-typed field of that
    /// name declared here supplies its default, or its only allowed value.
    pub fn own_tag(&self, field: &str) -> Option<Value> {
        if let Some(v) = self.constant(field) {
            return Some(v.clone());
        }
        let decl = self
            .fields
            .iter()
            .find(|d| d.name == field && d.marker == FieldMarker::Regular)?;
        let TypeDescriptor::Literal(allowed) = &decl.ty else {
            return None;
        };
        match &decl.default {
            FieldDefault::Value(v) => v.scalar_value(),
            _ if allowed.len() == 1 => allowed.first().cloned(),
            _ => None,
        }
    }
}

/// Builder for [`RecordType`].
#[derive(Debug)]
pub struct RecordTypeBuilder {
    inner: RecordType,
}

impl RecordTypeBuilder {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            inner: RecordType {
                name: name.into(),
                base: None,
                fields: Vec::new(),
                constants: IndexMap::new(),
            },
        }
    }

    /// Inherit from `base`.
    pub fn extends(mut self, base: impl Into<Arc<str>>) -> Self {
        self.inner.base = Some(base.into());
        self
    }

    /// Add a required field.
    pub fn field(self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.decl(FieldDecl::new(name, ty))
    }

    /// Add a field with a default value.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        ty: TypeDescriptor,
        default: impl Into<Native>,
    ) -> Self {
        self.decl(FieldDecl::new(name, ty).default(default))
    }

    /// Add a fully specified field.
    pub fn decl(mut self, decl: FieldDecl) -> Self {
        self.inner.fields.push(decl);
        self
    }

    /// Add a class-level constant.
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.constants.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> RecordType {
        self.inner
    }
}
