// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record compilation.
//!
//! - `dispatch`: field type descriptor to encode/decode plans
//! - `discriminator`: polymorphic fields
//! - `assemble`: per-field plans to a [`RecordCodec`]
//! - `plan`: the executable plan trees

mod assemble;
mod discriminator;
mod dispatch;
mod plan;

pub use assemble::RecordCodec;

pub(crate) use assemble::compile_record;

#[cfg(test)]
mod tests;
