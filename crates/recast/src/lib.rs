// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # recast - schema-compiled record converters
//!
//! Converts typed record instances to generic value trees (maps, sequences
//! and scalars) and back. Each record type is analysed once: its declared
//! fields are compiled into a pair of conversion routines that are cached and
//! reused for every later call.
//!
//! ## Quick Start
//!
//! ```rust
//! use recast::{DiscriminatorSpec, Instance, Options, RecordType, Registry, TypeDescriptor, Value};
//!
//! let registry = Registry::new();
//! registry.declare(RecordType::builder("Shape").build()).unwrap();
//! registry
//!     .declare(
//!         RecordType::builder("Circle")
//!             .extends("Shape")
//!             .field_with_default("kind", TypeDescriptor::literal(["circle"]), "circle")
//!             .field("r", TypeDescriptor::float())
//!             .build(),
//!     )
//!     .unwrap();
//! registry
//!     .declare(
//!         RecordType::builder("Drawing")
//!             .field(
//!                 "shapes",
//!                 TypeDescriptor::list(TypeDescriptor::polymorphic(
//!                     "Shape",
//!                     DiscriminatorSpec::new().field("kind").include_subtypes(),
//!                 )),
//!             )
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let tree = Value::map([(
//!     "shapes",
//!     Value::seq([Value::map([("kind", Value::from("circle")), ("r", Value::from(1.5))])]),
//! )]);
//! let drawing = registry.decode("Drawing", &tree, Options::default()).unwrap();
//! assert_eq!(registry.encode("Drawing", &drawing, Options::default()).unwrap(), tree);
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! RecordType --(schema)--> ClassSchema --(compile)--> RecordCodec --(registry)--> cache
//!                                          |
//!                              per field: EncodePlan / DecodePlan
//! ```
//!
//! ## Modules Overview
//!
//! - [`types`] - record type declarations and field type descriptors
//! - [`schema`] - flattening of a record type and its bases into fields
//! - [`registry`] - declared types, compiled codec cache, process-wide registry
//! - [`config`] - runtime [`Options`] and compiled-in [`Dialect`]s
//! - [`value`] / [`native`] - generic trees and typed field values
//! - `wire` - byte formats over the generic tree (`json` feature)

/// Runtime options and dialects.
pub mod config;
/// Error taxonomy.
pub mod error;
/// Typed field values and record instances.
pub mod native;
/// Declared types and the codec cache.
pub mod registry;
/// Field resolution over base chains.
pub mod schema;
/// Record type declarations.
pub mod types;
/// Generic value trees.
pub mod value;
/// Byte formats over generic trees.
#[cfg(feature = "json")]
pub mod wire;

mod compile;

pub use compile::RecordCodec;
pub use config::{Dialect, NativeKind, Options};
pub use error::{ConvertError, DecodeError, EncodeError, Error, Result, SchemaError};
pub use native::{EnumMember, Instance, Native, NativeSet, PathValue};
pub use registry::{global, Registry, RegistryStats};
pub use types::{
    DiscriminatorSpec, EnumType, FieldDecl, FieldDefault, PathFlavor, RecordType,
    SerializableType, SerializationStrategy, TypeDescriptor,
};
pub use value::{Map, Value};
