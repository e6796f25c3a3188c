// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! User-supplied conversion hooks.
//!
//! - [`SerializationStrategy`]: an object used as a field type; it converts
//!   values it does not own (e.g. [`RoundedDecimal`]).
//! - [`SerializableType`]: a user value type that converts itself; wrapped
//!   into a [`ProtocolType`] by [`Protocol`].

use crate::native::Native;
use crate::value::Value;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Error returned by user hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Field-level conversion strategy.
pub trait SerializationStrategy: fmt::Debug + Send + Sync {
    /// Name shown as the field's type in messages.
    fn name(&self) -> &str;

    fn serialize(&self, value: &Native) -> Result<Value, HookError>;

    fn deserialize(&self, value: &Value) -> Result<Native, HookError>;
}

/// A user value type that converts itself to and from the generic tree.
///
/// Values travel as [`Native::Custom`].
pub trait SerializableType: fmt::Debug + PartialEq + Send + Sync + Sized + 'static {
    /// Name shown as the field's type in messages.
    const TYPE_NAME: &'static str;

    fn serialize(&self) -> Result<Value, HookError>;

    fn deserialize(value: &Value) -> Result<Self, HookError>;
}

/// Object-safe view of a [`SerializableType`].
pub trait ProtocolType: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn serialize(&self, value: &Native) -> Result<Value, HookError>;

    fn deserialize(&self, value: &Value) -> Result<Native, HookError>;
}

/// Adapter from a [`SerializableType`] to a [`ProtocolType`].
pub struct Protocol<T>(PhantomData<fn() -> T>);

impl<T> Protocol<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Protocol<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SerializableType> fmt::Debug for Protocol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Protocol<{}>", T::TYPE_NAME)
    }
}

impl<T: SerializableType> ProtocolType for Protocol<T> {
    fn type_name(&self) -> &str {
        T::TYPE_NAME
    }

    fn serialize(&self, value: &Native) -> Result<Value, HookError> {
        match value {
            Native::Custom(custom) => match custom.downcast_ref::<T>() {
                Some(v) => v.serialize(),
                None => Err(format!("expected a {} value, found {:?}", T::TYPE_NAME, custom).into()),
            },
            other => Err(format!("expected a {} value, found {}", T::TYPE_NAME, other.kind_name()).into()),
        }
    }

    fn deserialize(&self, value: &Value) -> Result<Native, HookError> {
        T::deserialize(value).map(Native::custom)
    }
}

// ============================================================================
// Built-in strategies
// ============================================================================

/// Decimal encoded as text with a fixed number of places.
///
/// Without `places` the value is written as-is.
#[derive(Debug, Clone, Copy)]
pub struct RoundedDecimal {
    places: Option<u32>,
    rounding: RoundingStrategy,
}

impl RoundedDecimal {
    /// Round half to even, the decimal default.
    pub fn new(places: Option<u32>) -> Self {
        Self {
            places,
            rounding: RoundingStrategy::MidpointNearestEven,
        }
    }

    #[must_use]
    pub fn with_rounding(mut self, rounding: RoundingStrategy) -> Self {
        self.rounding = rounding;
        self
    }
}

impl SerializationStrategy for RoundedDecimal {
    fn name(&self) -> &str {
        "RoundedDecimal"
    }

    fn serialize(&self, value: &Native) -> Result<Value, HookError> {
        let Native::Decimal(d) = value else {
            return Err(format!("expected decimal, found {}", value.kind_name()).into());
        };
        let text = match self.places {
            Some(places) => {
                let mut rounded = d.round_dp_with_strategy(places, self.rounding);
                rounded.rescale(places);
                rounded.to_string()
            }
            None => d.to_string(),
        };
        Ok(Value::Str(text))
    }

    fn deserialize(&self, value: &Value) -> Result<Native, HookError> {
        let decimal = match value {
            Value::Str(s) => Decimal::from_str(s.trim())?,
            Value::Int(i) => Decimal::from(*i),
            Value::Float(f) => Decimal::from_str(&f.to_string())?,
            other => return Err(format!("expected decimal text, found {}", other.kind_name()).into()),
        };
        Ok(Native::Decimal(decimal))
    }
}
