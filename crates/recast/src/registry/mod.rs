// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry of declared record types and their compiled codecs.
//!
//! Each `(record type, dialect)` pair is compiled once, on first use, and the
//! resulting [`RecordCodec`] is shared from then on. Nested record types are
//! compiled eagerly along with their owner, so schema errors anywhere in the
//! reachable graph surface on the first call.
//!
//! # Example
//!
//! ```
//! use recast::{Instance, Options, RecordType, Registry, TypeDescriptor, Value};
//!
//! let registry = Registry::new();
//! registry
//!     .declare(
//!         RecordType::builder("Point")
//!             .field("x", TypeDescriptor::int())
//!             .field("y", TypeDescriptor::int())
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let point = Instance::new("Point").with("x", 1).with("y", 2);
//! let tree = registry.encode("Point", &point, Options::default()).unwrap();
//! assert_eq!(tree.get("y"), Some(&Value::Int(2)));
//!
//! let back = registry.decode("Point", &tree, Options::default()).unwrap();
//! assert_eq!(back, point);
//! ```

mod link;

pub(crate) use link::Link;

use crate::compile::{compile_record, RecordCodec};
use crate::config::{Dialect, Options};
use crate::error::{Result, SchemaError};
use crate::native::{Instance, Native};
use crate::types::RecordType;
use crate::value::Value;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Instant;

type CodecKey = (Arc<str>, Dialect);

/// Build and cache-hit counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub hits: u64,
    pub builds: u64,
    pub last_build_ns: u64,
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Default)]
pub(crate) struct RegistryInner {
    types: RwLock<IndexMap<Arc<str>, Arc<RecordType>>>,
    compiled: DashMap<CodecKey, Arc<RecordCodec>>,
    /// Keys currently being compiled, per thread.
    building: Mutex<HashSet<(CodecKey, ThreadId)>>,
    /// Codecs compiled under an outer build, published when it succeeds.
    staged: Mutex<HashMap<ThreadId, HashMap<CodecKey, Arc<RecordCodec>>>>,
    stats: RwLock<RegistryStats>,
}

impl RegistryInner {
    pub(crate) fn record_type(&self, name: &str) -> Option<Arc<RecordType>> {
        self.types.read().get(name).cloned()
    }

    /// Base chain of `name`, oldest base first, ending with `name` itself.
    pub(crate) fn chain(&self, name: &str) -> std::result::Result<Vec<Arc<RecordType>>, SchemaError> {
        let types = self.types.read();
        let mut chain = Vec::new();
        let mut current = Some(name);
        while let Some(n) = current {
            let rt = types.get(n).ok_or_else(|| SchemaError::UnresolvedType {
                name: n.to_string(),
                referenced_by: chain.last().map(|rt: &Arc<RecordType>| rt.name().to_string()),
            })?;
            if chain.len() > types.len() {
                return Err(SchemaError::InheritanceCycle(name.to_string()));
            }
            chain.push(Arc::clone(rt));
            current = rt.base();
        }
        chain.reverse();
        Ok(chain)
    }

    /// Every record type deriving from `name`, directly or not.
    ///
    /// Deepest first; declaration order within the same depth.
    pub(crate) fn descendants(&self, name: &str) -> Vec<Arc<RecordType>> {
        let types = self.types.read();
        let mut depths: HashMap<&str, Option<usize>> = HashMap::with_capacity(types.len());
        depths.insert(name, Some(0));

        let mut found: Vec<(usize, Arc<RecordType>)> = Vec::new();
        for (type_name, rt) in types.iter() {
            if let Some(depth) = depth_below(&types, &mut depths, type_name) {
                if depth > 0 {
                    found.push((depth, Arc::clone(rt)));
                }
            }
        }
        found.sort_by(|a, b| b.0.cmp(&a.0));
        found.into_iter().map(|(_, rt)| rt).collect()
    }

    pub(crate) fn get_or_build(
        self: &Arc<Self>,
        name: &str,
        dialect: &Dialect,
    ) -> std::result::Result<Arc<RecordCodec>, SchemaError> {
        let key: CodecKey = (Arc::from(name), dialect.clone());
        let tid = thread::current().id();

        if let Some(hit) = self.compiled.get(&key) {
            self.stats.write().hits += 1;
            return Ok(Arc::clone(hit.value()));
        }
        let staged = self.staged.lock().get(&tid).and_then(|s| s.get(&key).cloned());
        if let Some(hit) = staged {
            self.stats.write().hits += 1;
            return Ok(hit);
        }

        // Codecs built under an outer build stay staged until it succeeds.
        let outer = !self.building.lock().iter().any(|(_, t)| *t == tid);
        if outer {
            self.staged.lock().remove(&tid);
        }

        let start = Instant::now();
        let built = {
            let _guard = BuildGuard::enter(self, key.clone());
            compile_record(self, name, dialect)
        };

        let codec = if outer {
            let nested = self.staged.lock().remove(&tid).unwrap_or_default();
            let codec = Arc::new(built.map_err(|e| {
                log::debug!(
                    "[Registry::get_or_build] {} failed, dropping {} nested codec(s): {}",
                    name,
                    nested.len(),
                    e
                );
                e
            })?);
            for (nested_key, nested_codec) in nested {
                self.compiled.entry(nested_key).or_insert(nested_codec);
            }
            Arc::clone(self.compiled.entry(key).or_insert(codec).value())
        } else {
            let codec = Arc::new(built?);
            self.staged
                .lock()
                .entry(tid)
                .or_default()
                .insert(key, Arc::clone(&codec));
            codec
        };

        let elapsed = start.elapsed().as_nanos() as u64;
        {
            let mut stats = self.stats.write();
            stats.builds += 1;
            stats.last_build_ns = elapsed;
        }
        log::debug!(
            "[Registry::get_or_build] compiled {} ({} field(s), dialect {}) in {}ns",
            name,
            codec.field_names().count(),
            dialect.name(),
            elapsed
        );
        Ok(codec)
    }

    /// Link a field to the codec of `name`, deferring when `name` is still
    /// being compiled on this thread.
    pub(crate) fn link(
        self: &Arc<Self>,
        name: &str,
        dialect: &Dialect,
        referenced_by: &str,
    ) -> std::result::Result<Link, SchemaError> {
        let rt = self
            .record_type(name)
            .ok_or_else(|| SchemaError::UnresolvedType {
                name: name.to_string(),
                referenced_by: Some(referenced_by.to_string()),
            })?;
        let key: CodecKey = (Arc::clone(rt.name_arc()), dialect.clone());

        if self.building.lock().contains(&(key.clone(), thread::current().id())) {
            log::trace!(
                "[Registry::link] {} -> {} deferred (in progress)",
                referenced_by,
                name
            );
            return Ok(Link::deferred(self, key.0, dialect));
        }
        self.get_or_build(name, dialect).map(Link::resolved)
    }
}

fn depth_below<'a>(
    types: &'a IndexMap<Arc<str>, Arc<RecordType>>,
    depths: &mut HashMap<&'a str, Option<usize>>,
    name: &'a str,
) -> Option<usize> {
    if let Some(known) = depths.get(name) {
        return *known;
    }
    // Placeholder while the base chain is walked.
    depths.insert(name, None);
    let depth = types
        .get(name)
        .and_then(|rt| rt.base())
        .and_then(|base| types.get_key_value(base))
        .and_then(|(base, _)| depth_below(types, depths, base))
        .map(|d| d + 1);
    depths.insert(name, depth);
    depth
}

struct BuildGuard<'a> {
    inner: &'a RegistryInner,
    key: (CodecKey, ThreadId),
}

impl<'a> BuildGuard<'a> {
    fn enter(inner: &'a RegistryInner, key: CodecKey) -> Self {
        let key = (key, thread::current().id());
        inner.building.lock().insert(key.clone());
        Self { inner, key }
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.inner.building.lock().remove(&self.key);
    }
}

// ============================================================================
// Public handle
// ============================================================================

/// Declared record types and the codecs compiled for them.
///
/// Cloning is cheap; clones share the same tables.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a record type.
    ///
    /// Its base, if any, must already be declared. Nested record types used
    /// by its fields only need to exist by the time it is first compiled.
    pub fn declare(&self, record: RecordType) -> std::result::Result<(), SchemaError> {
        let mut types = self.inner.types.write();
        if types.contains_key(record.name()) {
            return Err(SchemaError::DuplicateType(record.name().to_string()));
        }
        if let Some(base) = record.base() {
            if base == record.name() {
                return Err(SchemaError::InheritanceCycle(base.to_string()));
            }
            if !types.contains_key(base) {
                return Err(SchemaError::UnresolvedType {
                    name: base.to_string(),
                    referenced_by: Some(record.name().to_string()),
                });
            }
        }
        log::trace!(
            "[Registry::declare] {} (base {:?}, {} own field(s))",
            record.name(),
            record.base(),
            record.own_fields().len()
        );
        types.insert(Arc::clone(record.name_arc()), Arc::new(record));
        Ok(())
    }

    pub fn record_type(&self, name: &str) -> Option<Arc<RecordType>> {
        self.inner.record_type(name)
    }

    /// Descendants of `name`, deepest first.
    pub fn descendants(&self, name: &str) -> Vec<Arc<RecordType>> {
        self.inner.descendants(name)
    }

    /// Codec of `name` for the default dialect.
    pub fn codec(&self, name: &str) -> std::result::Result<Arc<RecordCodec>, SchemaError> {
        self.codec_for(name, &Dialect::default())
    }

    pub fn codec_for(
        &self,
        name: &str,
        dialect: &Dialect,
    ) -> std::result::Result<Arc<RecordCodec>, SchemaError> {
        self.inner.get_or_build(name, dialect)
    }

    /// Encode an instance of `name` into a generic tree.
    pub fn encode(&self, name: &str, instance: &Instance, opts: Options) -> Result<Value> {
        Ok(self.codec(name)?.to_generic(instance, opts)?)
    }

    /// Decode a generic tree into an instance of `name`.
    pub fn decode(&self, name: &str, tree: &Value, opts: Options) -> Result<Instance> {
        Ok(self.codec(name)?.from_generic(tree, opts)?)
    }

    /// Construct an instance of `name` from field values, filling defaults.
    pub fn instantiate<I, K>(&self, name: &str, fields: I) -> Result<Instance>
    where
        I: IntoIterator<Item = (K, Native)>,
        K: Into<String>,
    {
        Ok(self.codec(name)?.instantiate(fields)?)
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        *self.inner.stats.read()
    }

    /// Number of declared record types.
    pub fn len(&self) -> usize {
        self.inner.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.len())
            .field("compiled", &self.inner.compiled.len())
            .finish()
    }
}

/// Process-wide registry.
pub fn global() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::new)
}
