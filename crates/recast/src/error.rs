// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy.
//!
//! Three phases can fail independently:
//!
//! - **Compile** ([`SchemaError`]): a record type uses a shape that has no
//!   conversion rule, or references a type that was never declared. Raised
//!   the first time the record type is compiled and fatal for that type.
//! - **Decode** ([`DecodeError`]): the generic tree handed to a compiled
//!   decoder does not fit the schema.
//! - **Encode** ([`EncodeError`]): the typed instance does not carry what its
//!   record type declares.
//!
//! Per-value failures inside a field are reported as a [`ConvertError`] and
//! wrapped by the owning field, so callers always learn which field failed.

use crate::types::HookError;
use crate::value::Value;
use std::fmt;

// ============================================================================
// Compile-time errors
// ============================================================================

/// Errors raised while compiling a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field's declared type has no conversion rule.
    UnserializableField {
        /// Field name.
        field: String,
        /// Rendered declared type of the field.
        type_name: String,
        /// Record type owning the field.
        record: String,
        /// What exactly is unsupported, and how to fix it.
        note: Option<String>,
    },
    /// A record type name that is not declared in the registry.
    UnresolvedType {
        /// The missing record type.
        name: String,
        /// Record type that referenced it, if any.
        referenced_by: Option<String>,
    },
    /// A record type with this name is already declared.
    DuplicateType(String),
    /// A record type lists itself in its base chain.
    InheritanceCycle(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnserializableField {
                field,
                type_name,
                record,
                note,
            } => {
                write!(
                    f,
                    "Field \"{}\" of type {} in {} is not serializable",
                    field, type_name, record
                )?;
                if let Some(note) = note {
                    write!(f, ": {}", note)?;
                }
                Ok(())
            }
            Self::UnresolvedType {
                name,
                referenced_by: Some(owner),
            } => write!(f, "Record type {} referenced by {} is not declared", name, owner),
            Self::UnresolvedType {
                name,
                referenced_by: None,
            } => write!(f, "Record type {} is not declared", name),
            Self::DuplicateType(name) => write!(f, "Record type {} is already declared", name),
            Self::InheritanceCycle(name) => {
                write!(f, "Record type {} appears in its own base chain", name)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

// ============================================================================
// Per-value conversion failures
// ============================================================================

/// Why a single value could not be converted.
///
/// Never surfaces alone from a compiled routine: the owning field wraps it in
/// [`DecodeError::InvalidFieldValue`] or [`EncodeError::InvalidValue`].
#[derive(Debug)]
pub enum ConvertError {
    /// The value has the wrong shape.
    Expected {
        expected: &'static str,
        found: &'static str,
    },
    /// Text that should hold a value of `target` could not be parsed.
    Parse {
        target: &'static str,
        text: String,
        reason: String,
    },
    /// A literal-typed value outside its allowed set.
    NotAllowed { value: Value, allowed: String },
    /// No member of the enum carries this value.
    UnknownEnumValue { enum_name: String, value: Value },
    /// An enum member of another enum type.
    WrongEnum { expected: String, found: String },
    /// A number outside the representable range of the target kind.
    OutOfRange { target: &'static str, value: Value },
    /// A value the encoded form can only approximate.
    Inexact { target: &'static str, value: String },
    /// A path that is not valid UTF-8.
    NonUtf8Path,
    /// The tag field is absent from the input map.
    MissingTag { field: String },
    /// The tag value does not select any candidate.
    UnknownTag { field: String, tag: Value },
    /// Every structural candidate rejected the input.
    NoMatchingVariant { base: String, tried: usize },
    /// A polymorphic value whose record type is not the base or a descendant.
    NotASubtype { base: String, found: String },
    /// A user strategy or protocol hook failed.
    Hook(HookError),
    /// A nested record failed to decode.
    Decode(Box<DecodeError>),
    /// A nested record failed to encode.
    Encode(Box<EncodeError>),
    /// A lazily linked record type failed to compile.
    Schema(SchemaError),
    /// A lazily linked record type outlived its registry.
    Detached(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            Self::Parse {
                target,
                text,
                reason,
            } => write!(f, "cannot parse {:?} as {}: {}", text, target, reason),
            Self::NotAllowed { value, allowed } => {
                write!(f, "{} is not one of {}", value, allowed)
            }
            Self::UnknownEnumValue { enum_name, value } => {
                write!(f, "{} is not a valid {}", value, enum_name)
            }
            Self::WrongEnum { expected, found } => {
                write!(f, "expected a member of {}, found a member of {}", expected, found)
            }
            Self::OutOfRange { target, value } => {
                write!(f, "{} is out of range for {}", value, target)
            }
            Self::Inexact { target, value } => {
                write!(f, "{} cannot be written as {} without loss", value, target)
            }
            Self::NonUtf8Path => write!(f, "path is not valid UTF-8"),
            Self::MissingTag { field } => write!(f, "tag field \"{}\" is missing", field),
            Self::UnknownTag { field, tag } => {
                write!(f, "unknown value {} for tag field \"{}\"", tag, field)
            }
            Self::NoMatchingVariant { base, tried } => write!(
                f,
                "none of the {} candidate subtypes of {} accepted the value",
                tried, base
            ),
            Self::NotASubtype { base, found } => {
                write!(f, "{} is not {} or one of its subtypes", found, base)
            }
            Self::Hook(e) => write!(f, "hook failed: {}", e),
            Self::Decode(e) => write!(f, "{}", e),
            Self::Encode(e) => write!(f, "{}", e),
            Self::Schema(e) => write!(f, "{}", e),
            Self::Detached(name) => write!(f, "registry for {} was dropped", name),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hook(e) => Some(e.as_ref()),
            Self::Decode(e) => Some(e.as_ref()),
            Self::Encode(e) => Some(e.as_ref()),
            Self::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HookError> for ConvertError {
    fn from(e: HookError) -> Self {
        Self::Hook(e)
    }
}

impl From<DecodeError> for ConvertError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(Box::new(e))
    }
}

impl From<EncodeError> for ConvertError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(Box::new(e))
    }
}

// ============================================================================
// Decode errors
// ============================================================================

/// Errors raised by a compiled decode routine.
#[derive(Debug)]
pub enum DecodeError {
    /// A required field is absent from the input map.
    MissingField {
        field: String,
        type_name: String,
        record: String,
    },
    /// A present field failed to decode.
    InvalidFieldValue {
        field: String,
        type_name: String,
        /// The offending raw value.
        value: Value,
        record: String,
        source: ConvertError,
    },
    /// The input is not a map.
    ArgumentShape { record: String, found: &'static str },
    /// The constructor received a field the record type does not declare.
    UnknownField { field: String, record: String },
}

impl DecodeError {
    /// Name of the field this error is about, if any.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::MissingField { field, .. }
            | Self::InvalidFieldValue { field, .. }
            | Self::UnknownField { field, .. } => Some(field),
            Self::ArgumentShape { .. } => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField {
                field,
                type_name,
                record,
            } => write!(
                f,
                "Field \"{}\" of type {} is missing in {} instance",
                field, type_name, record
            ),
            Self::InvalidFieldValue {
                field,
                type_name,
                value,
                record,
                ..
            } => write!(
                f,
                "Field \"{}\" of type {} in {} has invalid value {}",
                field, type_name, record, value
            ),
            Self::ArgumentShape { record, found } => write!(
                f,
                "Argument for {} decoding should be a map, got {}",
                record, found
            ),
            Self::UnknownField { field, record } => {
                write!(f, "{} has no field \"{}\"", record, field)
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidFieldValue { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// Encode errors
// ============================================================================

/// Errors raised by a compiled encode routine.
#[derive(Debug)]
pub enum EncodeError {
    /// The instance has no value for a declared field.
    MissingAttribute { field: String, record: String },
    /// The instance belongs to another record type.
    WrongRecordType { expected: String, found: String },
    /// A field value failed to encode.
    InvalidValue {
        field: String,
        record: String,
        source: ConvertError,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute { field, record } => {
                write!(f, "{} instance has no value for field \"{}\"", record, field)
            }
            Self::WrongRecordType { expected, found } => {
                write!(f, "Expected a {} instance, got {}", expected, found)
            }
            Self::InvalidValue {
                field,
                record,
                source,
            } => write!(
                f,
                "Field \"{}\" in {} cannot be encoded: {}",
                field, record, source
            ),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidValue { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// Crate-level error
// ============================================================================

/// Any error produced by this crate.
#[derive(Debug)]
pub enum Error {
    Schema(SchemaError),
    Decode(DecodeError),
    Encode(EncodeError),
    #[cfg(feature = "json")]
    Wire(crate::wire::WireError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "Schema error: {}", e),
            Self::Decode(e) => write!(f, "Decode error: {}", e),
            Self::Encode(e) => write!(f, "Encode error: {}", e),
            #[cfg(feature = "json")]
            Self::Wire(e) => write!(f, "Wire error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Encode(e) => Some(e),
            #[cfg(feature = "json")]
            Self::Wire(e) => Some(e),
        }
    }
}

impl From<SchemaError> for Error {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

#[cfg(feature = "json")]
impl From<crate::wire::WireError> for Error {
    fn from(e: crate::wire::WireError) -> Self {
        Self::Wire(e)
    }
}

/// Result alias for fallible crate operations.
pub type Result<T> = std::result::Result<T, Error>;
