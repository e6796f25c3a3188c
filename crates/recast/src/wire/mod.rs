// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire formats on top of the generic tree.
//!
//! A [`WireFormat`] pairs a [`Dialect`] with an encoder from [`Value`] to
//! bytes and a decoder back. Record types are compiled once per dialect, so
//! a format can ask for date/time/uuid leaves to stay native and write them
//! itself.
//!
//! # Example
//!
//! ```
//! use recast::wire::WireFormat;
//! use recast::{Instance, Options, RecordType, Registry, TypeDescriptor};
//!
//! let registry = Registry::new();
//! registry
//!     .declare(RecordType::builder("User").field("name", TypeDescriptor::str()).build())
//!     .unwrap();
//!
//! let json = WireFormat::json();
//! let user = Instance::new("User").with("name", "ada");
//! let bytes = json.dump(&registry, &user, Options::default()).unwrap();
//! assert_eq!(bytes, br#"{"name":"ada"}"#);
//! assert_eq!(json.load(&registry, "User", &bytes, Options::default()).unwrap(), user);
//! ```

use crate::config::{Dialect, NativeKind, Options};
use crate::error::Result;
use crate::native::Instance;
use crate::registry::Registry;
use crate::types::HookError;
use crate::value::Value;
use std::fmt;

/// Name of the dialect used by [`WireFormat::json`].
pub const JSON_DIALECT: &str = "json";

/// Errors raised by a wire encoder or decoder.
#[derive(Debug)]
pub enum WireError {
    /// The bytes are not a valid document.
    Malformed(HookError),
    /// The tree holds something the format cannot represent.
    Unrepresentable(HookError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed input: {}", e),
            Self::Unrepresentable(e) => write!(f, "cannot represent value: {}", e),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) | Self::Unrepresentable(e) => Some(e.as_ref()),
        }
    }
}

pub type EncodeFn = fn(&Value) -> std::result::Result<Vec<u8>, WireError>;
pub type DecodeFn = fn(&[u8]) -> std::result::Result<Value, WireError>;

/// A dialect plus the byte encoder/decoder that goes with it.
#[derive(Debug, Clone)]
pub struct WireFormat {
    dialect: Dialect,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl WireFormat {
    pub fn new(dialect: Dialect, encode: EncodeFn, decode: DecodeFn) -> Self {
        Self {
            dialect,
            encode,
            decode,
        }
    }

    /// JSON through `serde_json`; dates, times, datetimes and UUIDs are
    /// written by the encoder from native leaves.
    pub fn json() -> Self {
        let dialect = Dialect::new(JSON_DIALECT)
            .serialize_native(NativeKind::Date)
            .serialize_native(NativeKind::Time)
            .serialize_native(NativeKind::DateTime)
            .serialize_native(NativeKind::Uuid);
        Self::new(dialect, json_encode, json_decode)
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Encode `instance` to bytes.
    pub fn dump(&self, registry: &Registry, instance: &Instance, opts: Options) -> Result<Vec<u8>> {
        let codec = registry.codec_for(instance.record(), &self.dialect)?;
        let tree = codec.to_generic(instance, opts)?;
        Ok((self.encode)(&tree)?)
    }

    /// Decode bytes into an instance of `record`.
    pub fn load(&self, registry: &Registry, record: &str, bytes: &[u8], opts: Options) -> Result<Instance> {
        let codec = registry.codec_for(record, &self.dialect)?;
        let tree = (self.decode)(bytes)?;
        Ok(codec.from_generic(&tree, opts)?)
    }
}

pub fn json_encode(tree: &Value) -> std::result::Result<Vec<u8>, WireError> {
    serde_json::to_vec(tree).map_err(|e| WireError::Unrepresentable(Box::new(e)))
}

pub fn json_decode(bytes: &[u8]) -> std::result::Result<Value, WireError> {
    serde_json::from_slice(bytes).map_err(|e| WireError::Malformed(Box::new(e)))
}
