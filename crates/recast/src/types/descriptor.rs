// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field type descriptors.

use super::record::DiscriminatorSpec;
use super::strategy::{Protocol, ProtocolType, SerializableType, SerializationStrategy};
use crate::native::{EnumMember, PathFlavor};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Int,
    Float,
    Bool,
    Str,
    Bytes,
    ByteArray,
    /// The unit/none type.
    NoneType,
}

/// Homogeneous collection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    List,
    Tuple,
    Deque,
    Sequence,
    Set,
    FrozenSet,
}

impl SequenceKind {
    /// Decoded values collapse duplicates.
    pub fn is_set(self) -> bool {
        matches!(self, Self::Set | Self::FrozenSet)
    }
}

/// Container kinds that are only valid with element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Tuple,
    Deque,
    Set,
    FrozenSet,
    Dict,
    ChainMap,
    Sequence,
    Mapping,
}

impl ContainerKind {
    fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Deque => "deque",
            Self::Set => "set",
            Self::FrozenSet => "frozenset",
            Self::Dict => "dict",
            Self::ChainMap => "ChainMap",
            Self::Sequence => "Sequence",
            Self::Mapping => "Mapping",
        }
    }

    /// The parametrized spelling to use instead.
    pub fn hint(self) -> &'static str {
        match self {
            Self::List => "List[T]",
            Self::Tuple => "Tuple[T]",
            Self::Deque => "Deque[T]",
            Self::Set => "Set[T]",
            Self::FrozenSet => "FrozenSet[T]",
            Self::Dict => "Dict[KT, VT]",
            Self::ChainMap => "ChainMap[KT, VT]",
            Self::Sequence => "Sequence[T]",
            Self::Mapping => "Mapping[KT, VT]",
        }
    }
}

/// Date and time kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
}

/// The declared type of a field.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Optional(Box<TypeDescriptor>),
    /// Two-arm unions with the none type normalise to optionals; anything
    /// else is rejected at compile time.
    Union(Vec<TypeDescriptor>),
    Sequence(SequenceKind, Box<TypeDescriptor>),
    Mapping(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// Layered mapping; encodes as a sequence of maps.
    ChainMap(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Literal(Vec<Value>),
    Enum(Arc<EnumType>),
    Path(PathFlavor),
    Temporal(TemporalKind),
    Duration,
    Timezone,
    Uuid,
    Decimal,
    Rational,
    /// Nested record type, by name.
    Record(Arc<str>),
    /// Base record type decoded through a discriminator.
    Polymorphic(Arc<str>, DiscriminatorSpec),
    Strategy(Arc<dyn SerializationStrategy>),
    Protocol(Arc<dyn ProtocolType>),
    Any,

    // Shapes that have no conversion rule
    TypeVar(Arc<str>),
    AnyStr,
    Bare(ContainerKind),
}

impl TypeDescriptor {
    pub fn int() -> Self {
        Self::Primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        Self::Primitive(PrimitiveKind::Float)
    }

    pub fn bool() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    pub fn str() -> Self {
        Self::Primitive(PrimitiveKind::Str)
    }

    pub fn bytes() -> Self {
        Self::Primitive(PrimitiveKind::Bytes)
    }

    pub fn none() -> Self {
        Self::Primitive(PrimitiveKind::NoneType)
    }

    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn union(arms: impl IntoIterator<Item = Self>) -> Self {
        Self::Union(arms.into_iter().collect())
    }

    pub fn list(inner: Self) -> Self {
        Self::Sequence(SequenceKind::List, Box::new(inner))
    }

    pub fn tuple(inner: Self) -> Self {
        Self::Sequence(SequenceKind::Tuple, Box::new(inner))
    }

    pub fn deque(inner: Self) -> Self {
        Self::Sequence(SequenceKind::Deque, Box::new(inner))
    }

    pub fn set(inner: Self) -> Self {
        Self::Sequence(SequenceKind::Set, Box::new(inner))
    }

    pub fn frozenset(inner: Self) -> Self {
        Self::Sequence(SequenceKind::FrozenSet, Box::new(inner))
    }

    pub fn mapping(key: Self, value: Self) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }

    pub fn chain_map(key: Self, value: Self) -> Self {
        Self::ChainMap(Box::new(key), Box::new(value))
    }

    pub fn literal<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::Literal(values.into_iter().map(Into::into).collect())
    }

    pub fn date() -> Self {
        Self::Temporal(TemporalKind::Date)
    }

    pub fn time() -> Self {
        Self::Temporal(TemporalKind::Time)
    }

    pub fn datetime() -> Self {
        Self::Temporal(TemporalKind::DateTime)
    }

    pub fn record(name: impl Into<Arc<str>>) -> Self {
        Self::Record(name.into())
    }

    pub fn polymorphic(base: impl Into<Arc<str>>, spec: DiscriminatorSpec) -> Self {
        Self::Polymorphic(base.into(), spec)
    }

    pub fn strategy<S: SerializationStrategy + 'static>(strategy: S) -> Self {
        Self::Strategy(Arc::new(strategy))
    }

    /// Descriptor for a user type implementing [`SerializableType`].
    pub fn protocol<T: SerializableType>() -> Self {
        Self::Protocol(Arc::new(Protocol::<T>::new()))
    }

    /// Unwraps `Optional` and two-arm unions with the none type.
    pub fn optional_inner(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::Optional(inner) => Some(inner),
            Self::Union(arms) if arms.len() == 2 => {
                match (arms[0].is_none_type(), arms[1].is_none_type()) {
                    (true, false) => Some(&arms[1]),
                    (false, true) => Some(&arms[0]),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn is_none_type(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveKind::NoneType))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(match p {
                PrimitiveKind::Int => "int",
                PrimitiveKind::Float => "float",
                PrimitiveKind::Bool => "bool",
                PrimitiveKind::Str => "str",
                PrimitiveKind::Bytes => "bytes",
                PrimitiveKind::ByteArray => "bytearray",
                PrimitiveKind::NoneType => "None",
            }),
            Self::Optional(inner) => write!(f, "Optional[{}]", inner),
            Self::Union(arms) => {
                f.write_str("Union[")?;
                write_list(f, arms)?;
                f.write_str("]")
            }
            Self::Sequence(kind, inner) => {
                let name = match kind {
                    SequenceKind::List => "List",
                    SequenceKind::Tuple => "Tuple",
                    SequenceKind::Deque => "Deque",
                    SequenceKind::Sequence => "Sequence",
                    SequenceKind::Set => "Set",
                    SequenceKind::FrozenSet => "FrozenSet",
                };
                write!(f, "{}[{}]", name, inner)
            }
            Self::Mapping(k, v) => write!(f, "Dict[{}, {}]", k, v),
            Self::ChainMap(k, v) => write!(f, "ChainMap[{}, {}]", k, v),
            Self::Literal(values) => {
                f.write_str("Literal[")?;
                write_list(f, values)?;
                f.write_str("]")
            }
            Self::Enum(e) => f.write_str(&e.name),
            Self::Path(flavor) => f.write_str(flavor.name()),
            Self::Temporal(TemporalKind::Date) => f.write_str("date"),
            Self::Temporal(TemporalKind::Time) => f.write_str("time"),
            Self::Temporal(TemporalKind::DateTime) => f.write_str("datetime"),
            Self::Duration => f.write_str("timedelta"),
            Self::Timezone => f.write_str("timezone"),
            Self::Uuid => f.write_str("UUID"),
            Self::Decimal => f.write_str("Decimal"),
            Self::Rational => f.write_str("Fraction"),
            Self::Record(name) | Self::Polymorphic(name, _) => f.write_str(name),
            Self::Strategy(s) => f.write_str(s.name()),
            Self::Protocol(p) => f.write_str(p.type_name()),
            Self::Any => f.write_str("Any"),
            Self::TypeVar(name) => f.write_str(name),
            Self::AnyStr => f.write_str("AnyStr"),
            Self::Bare(kind) => f.write_str(kind.name()),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

// ============================================================================
// Enum types
// ============================================================================

/// A declared enum type: named members with string or integer values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: Arc<str>,
    members: Vec<(Arc<str>, Value)>,
}

impl EnumType {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a member, builder style.
    #[must_use]
    pub fn member(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.members.push((name.into(), value.into()));
        self
    }

    /// Member by name.
    pub fn get(&self, name: &str) -> Option<EnumMember> {
        self.members
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(n, v)| self.make(n, v))
    }

    /// Member carrying `value`.
    pub fn by_value(&self, value: &Value) -> Option<EnumMember> {
        self.members
            .iter()
            .find(|(_, v)| v == value)
            .map(|(n, v)| self.make(n, v))
    }

    /// All members carry integer values.
    pub fn is_integral(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(|(_, v)| matches!(v, Value::Int(_)))
    }

    fn make(&self, name: &Arc<str>, value: &Value) -> EnumMember {
        EnumMember {
            enum_name: Arc::clone(&self.name),
            name: Arc::clone(name),
            value: value.clone(),
        }
    }
}
