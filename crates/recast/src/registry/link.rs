// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Links from a compiled field to the codec of a nested record type.
//!
//! A link is resolved at compile time when the target can be built right
//! away. When the target is still being built further up the stack (a
//! recursive or mutually recursive schema), the link defers: it keeps a weak
//! handle on the registry and fetches the codec on first use.

use super::RegistryInner;
use crate::compile::RecordCodec;
use crate::config::Dialect;
use crate::error::ConvertError;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

#[derive(Clone)]
pub(crate) struct Link(Arc<LinkState>);

struct LinkState {
    record: Arc<str>,
    dialect: Dialect,
    registry: Weak<RegistryInner>,
    codec: OnceLock<Arc<RecordCodec>>,
}

impl Link {
    pub(crate) fn resolved(codec: Arc<RecordCodec>) -> Self {
        Self(Arc::new(LinkState {
            record: Arc::clone(codec.record_arc()),
            dialect: codec.dialect().clone(),
            registry: Weak::new(),
            codec: OnceLock::from(codec),
        }))
    }

    pub(crate) fn deferred(registry: &Arc<RegistryInner>, record: Arc<str>, dialect: &Dialect) -> Self {
        Self(Arc::new(LinkState {
            record,
            dialect: dialect.clone(),
            registry: Arc::downgrade(registry),
            codec: OnceLock::new(),
        }))
    }

    pub(crate) fn record(&self) -> &str {
        &self.0.record
    }

    pub(crate) fn get(&self) -> Result<&Arc<RecordCodec>, ConvertError> {
        if let Some(codec) = self.0.codec.get() {
            return Ok(codec);
        }
        let registry = self
            .0
            .registry
            .upgrade()
            .ok_or_else(|| ConvertError::Detached(self.0.record.to_string()))?;
        let codec = registry
            .get_or_build(&self.0.record, &self.0.dialect)
            .map_err(ConvertError::Schema)?;
        log::trace!("[Link::get] resolved deferred link to {}", self.0.record);
        Ok(self.0.codec.get_or_init(|| codec))
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("record", &self.0.record)
            .field("dialect", &self.0.dialect.name())
            .field("resolved", &self.0.codec.get().is_some())
            .finish()
    }
}
