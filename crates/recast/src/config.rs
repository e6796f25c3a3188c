// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion configuration.
//!
//! Two layers:
//! - [`Options`]: runtime flags passed to every encode/decode call.
//! - [`Dialect`]: compiled-in settings; a record type is compiled once per
//!   dialect and the dialect is part of the registry cache key.

use std::fmt;
use std::sync::Arc;

// =======================================================================
// Constants
// =======================================================================

/// Name of the dialect used when none is given.
pub const DEFAULT_DIALECT: &str = "default";

/// Field metadata key naming a per-field date/time parser.
pub const META_DESERIALIZE: &str = "deserialize";

/// Named parser: RFC 3339 timestamps (offset required).
pub const PARSER_RFC3339: &str = "rfc3339";

/// Named parser: RFC 2822 timestamps.
pub const PARSER_RFC2822: &str = "rfc2822";

// =======================================================================
// Runtime options
// =======================================================================

/// Flags controlling a single encode/decode call.
///
/// All flags default to `false`, which produces trees made only of
/// primitives, sequences and string-keyed maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Options {
    /// Keep byte strings raw instead of base64 text.
    pub use_bytes: bool,
    /// Keep enum members instead of their underlying values.
    pub use_enum: bool,
    /// Keep dates, times and datetimes instead of ISO-8601 text.
    pub use_datetime: bool,
    /// Leave null fields out of encoded maps.
    pub omit_none: bool,
}

impl Options {
    /// Primitive-only options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            use_bytes: false,
            use_enum: false,
            use_datetime: false,
            omit_none: false,
        }
    }

    #[must_use]
    pub const fn with_bytes(mut self, enabled: bool) -> Self {
        self.use_bytes = enabled;
        self
    }

    #[must_use]
    pub const fn with_enum(mut self, enabled: bool) -> Self {
        self.use_enum = enabled;
        self
    }

    #[must_use]
    pub const fn with_datetime(mut self, enabled: bool) -> Self {
        self.use_datetime = enabled;
        self
    }

    #[must_use]
    pub const fn with_omit_none(mut self, enabled: bool) -> Self {
        self.omit_none = enabled;
        self
    }

    /// Options used for mapping keys: keys always become text.
    #[must_use]
    pub(crate) const fn for_keys(self) -> Self {
        Self {
            use_bytes: false,
            use_enum: false,
            use_datetime: false,
            omit_none: self.omit_none,
        }
    }
}

// =======================================================================
// Dialect
// =======================================================================

/// Value kinds a dialect may hand through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NativeKind {
    Date,
    Time,
    DateTime,
    Uuid,
}

/// Compiled-in conversion settings for a target wire format.
///
/// A wire format that understands some value kinds natively declares them
/// here; those kinds then compile to identity conversions.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Dialect {
    name: Arc<str>,
    serialize: Vec<NativeKind>,
    deserialize: Vec<NativeKind>,
}

impl Dialect {
    /// Create a dialect with no native kinds.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            serialize: Vec::new(),
            deserialize: Vec::new(),
        }
    }

    /// Encode `kind` as itself.
    #[must_use]
    pub fn serialize_native(mut self, kind: NativeKind) -> Self {
        insert_sorted(&mut self.serialize, kind);
        self
    }

    /// Decode `kind` as itself.
    #[must_use]
    pub fn deserialize_native(mut self, kind: NativeKind) -> Self {
        insert_sorted(&mut self.deserialize, kind);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serializes_natively(&self, kind: NativeKind) -> bool {
        self.serialize.contains(&kind)
    }

    pub fn deserializes_natively(&self, kind: NativeKind) -> bool {
        self.deserialize.contains(&kind)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new(DEFAULT_DIALECT)
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("serialize", &self.serialize)
            .field("deserialize", &self.deserialize)
            .finish()
    }
}

// Keeps equal dialects hashing equal regardless of call order.
fn insert_sorted(kinds: &mut Vec<NativeKind>, kind: NativeKind) {
    if let Err(pos) = kinds.binary_search(&kind) {
        kinds.insert(pos, kind);
    }
}
