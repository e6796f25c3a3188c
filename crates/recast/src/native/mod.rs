// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed instances.
//!
//! [`Native`] is the value model on the typed side of a conversion: every
//! kind a field descriptor can name has a dedicated variant, and records are
//! [`Instance`]s tagged with their record type name. User-defined value types
//! travel as [`CustomValue`]s.
//!
//! # Example
//!
//! ```rust
//! use recast::native::{Instance, Native};
//!
//! let point = Instance::new("Point").with("x", 1).with("y", 2);
//! assert_eq!(point.get("x"), Some(&Native::Int(1)));
//! assert_eq!(point.record(), "Point");
//! ```

pub(crate) mod text;

use crate::value::Value;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use indexmap::IndexMap;
use num_rational::Ratio;
use rust_decimal::Decimal;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Ordered key/value pairs of a mapping value.
pub type NativeMap = Vec<(Native, Native)>;

/// A typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Native {
    // Primitives
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),

    // Collections
    Seq(Vec<Native>),
    Set(NativeSet),
    Map(NativeMap),
    ChainMap(Vec<NativeMap>),

    // Scalars with a canonical text form
    Enum(EnumMember),
    Path(PathValue),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Duration(TimeDelta),
    Timezone(FixedOffset),
    Uuid(Uuid),
    Decimal(Decimal),
    Rational(Ratio<i64>),

    // Composites
    Record(Instance),
    Custom(CustomValue),
}

impl Native {
    /// Wrap a user-defined value.
    pub fn custom<T: CustomData>(value: T) -> Self {
        Self::Custom(CustomValue::new(value))
    }

    /// Short name of the value kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Seq(_) => "sequence",
            Self::Set(_) => "set",
            Self::Map(_) => "mapping",
            Self::ChainMap(_) => "chain map",
            Self::Enum(_) => "enum member",
            Self::Path(_) => "path",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) | Self::DateTimeTz(_) => "datetime",
            Self::Duration(_) => "duration",
            Self::Timezone(_) => "timezone",
            Self::Uuid(_) => "uuid",
            Self::Decimal(_) => "decimal",
            Self::Rational(_) => "rational",
            Self::Record(_) => "record",
            Self::Custom(_) => "custom value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_record(&self) -> Option<&Instance> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Tree form of a scalar (null, bool, int, float, string).
    pub fn scalar_value(&self) -> Option<Value> {
        match self {
            Self::Null => Some(Value::Null),
            Self::Bool(v) => Some(Value::Bool(*v)),
            Self::Int(v) => Some(Value::Int(*v)),
            Self::Float(v) => Some(Value::Float(*v)),
            Self::Str(v) => Some(Value::Str(v.clone())),
            _ => None,
        }
    }

    /// Structural conversion used for untyped (`Any`) values.
    ///
    /// Tree-shaped values map node by node; everything else is carried as a
    /// [`Value::Native`] leaf.
    pub fn to_value(&self) -> Value {
        if let Some(v) = self.scalar_value() {
            return v;
        }
        match self {
            Self::Seq(items) => Value::Seq(items.iter().map(Native::to_value).collect()),
            Self::Set(items) => Value::Seq(items.iter().map(Native::to_value).collect()),
            Self::Bytes(b) => Value::Bytes(b.clone()),
            Self::Map(pairs) if pairs.iter().all(|(k, _)| matches!(k, Self::Str(_))) => {
                Value::Map(
                    pairs
                        .iter()
                        .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.to_value())))
                        .collect(),
                )
            }
            other => Value::Native(Box::new(other.clone())),
        }
    }

    /// Inverse of [`Native::to_value`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) => Self::Float(*v),
            Value::Str(v) => Self::Str(v.clone()),
            Value::Bytes(v) => Self::Bytes(v.clone()),
            Value::Seq(items) => Self::Seq(items.iter().map(Self::from_value).collect()),
            Value::Map(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (Self::Str(k.clone()), Self::from_value(v)))
                    .collect(),
            ),
            Value::Native(n) => (**n).clone(),
        }
    }
}

macro_rules! native_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Native {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

native_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => Str,
    Vec<u8> => Bytes,
    Vec<Native> => Seq,
    NativeSet => Set,
    EnumMember => Enum,
    PathValue => Path,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeTz,
    TimeDelta => Duration,
    FixedOffset => Timezone,
    Uuid => Uuid,
    Decimal => Decimal,
    Ratio<i64> => Rational,
    Instance => Record,
    CustomValue => Custom,
}

impl From<i32> for Native {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Native {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<VecDeque<Native>> for Native {
    fn from(v: VecDeque<Native>) -> Self {
        Self::Seq(v.into())
    }
}

impl<T: Into<Native>> From<Option<T>> for Native {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Sets
// ============================================================================

/// Insertion-ordered set; equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct NativeSet(Vec<Native>);

impl NativeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert unless an equal element is present. Returns whether inserted.
    pub fn insert(&mut self, value: Native) -> bool {
        if self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    pub fn contains(&self, value: &Native) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Native> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for NativeSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl FromIterator<Native> for NativeSet {
    fn from_iter<I: IntoIterator<Item = Native>>(iter: I) -> Self {
        let mut set = Self::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

impl<'a> IntoIterator for &'a NativeSet {
    type Item = &'a Native;
    type IntoIter = std::slice::Iter<'a, Native>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Enum members and paths
// ============================================================================

/// A member of a declared enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Owning enum type name.
    pub enum_name: Arc<str>,
    /// Member name.
    pub name: Arc<str>,
    /// Underlying value (string or integer).
    pub value: Value,
}

/// Concrete path flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathFlavor {
    PurePath,
    PurePosixPath,
    PureWindowsPath,
    Path,
    PosixPath,
    WindowsPath,
    /// Any path-like value; decodes as [`PathFlavor::PurePath`].
    PathLike,
}

impl PathFlavor {
    /// The flavor a decoded value of this declared flavor carries.
    pub fn concrete(self) -> Self {
        match self {
            Self::PathLike => Self::PurePath,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PurePath => "PurePath",
            Self::PurePosixPath => "PurePosixPath",
            Self::PureWindowsPath => "PureWindowsPath",
            Self::Path => "Path",
            Self::PosixPath => "PosixPath",
            Self::WindowsPath => "WindowsPath",
            Self::PathLike => "PathLike",
        }
    }
}

/// A filesystem path with its flavor.
#[derive(Debug, Clone, PartialEq)]
pub struct PathValue {
    pub flavor: PathFlavor,
    pub path: PathBuf,
}

impl PathValue {
    pub fn new(flavor: PathFlavor, path: impl Into<PathBuf>) -> Self {
        Self {
            flavor,
            path: path.into(),
        }
    }
}

// ============================================================================
// Record instances
// ============================================================================

/// An instance of a declared record type.
///
/// Field equality ignores insertion order; encoding order always follows the
/// record type's declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    record: Arc<str>,
    fields: IndexMap<String, Native>,
}

impl Instance {
    /// Create an empty instance of `record`.
    pub fn new(record: impl Into<Arc<str>>) -> Self {
        Self {
            record: record.into(),
            fields: IndexMap::new(),
        }
    }

    /// Set a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Native>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Native>) -> Option<Native> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Native> {
        self.fields.get(name)
    }

    /// Record type name.
    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Native)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// User-defined values
// ============================================================================

/// Type-erased user value.
///
/// Blanket-implemented for every `Debug + PartialEq + Send + Sync` type.
pub trait CustomData: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_data(&self, other: &dyn CustomData) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq + Send + Sync> CustomData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_data(&self, other: &dyn CustomData) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

/// Shared handle to a user value.
#[derive(Clone)]
pub struct CustomValue(Arc<dyn CustomData>);

impl CustomValue {
    pub fn new<T: CustomData>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        (*self.0).eq_data(&*other.0)
    }
}
