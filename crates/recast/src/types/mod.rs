// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record type declarations and field type descriptors.
//!
//! # Example
//!
//! ```rust
//! use recast::types::{FieldDecl, RecordType, TypeDescriptor};
//!
//! let point = RecordType::builder("Point")
//!     .field("x", TypeDescriptor::int())
//!     .field("y", TypeDescriptor::int())
//!     .decl(FieldDecl::new("label", TypeDescriptor::optional(TypeDescriptor::str())).default(None::<&str>))
//!     .build();
//!
//! assert_eq!(point.own_fields().len(), 3);
//! assert_eq!(point.own_fields()[2].ty.to_string(), "Optional[str]");
//! ```

mod descriptor;
mod record;
mod strategy;

pub use descriptor::{
    ContainerKind, EnumType, PrimitiveKind, SequenceKind, TemporalKind, TypeDescriptor,
};
pub use record::{
    DateParser, DiscriminatorSpec, Factory, FieldDecl, FieldDefault, FieldMarker, MetaValue,
    Metadata, RecordType, RecordTypeBuilder, Tagger,
};
pub use strategy::{
    HookError, Protocol, ProtocolType, RoundedDecimal, SerializableType, SerializationStrategy,
};

pub use crate::native::PathFlavor;
