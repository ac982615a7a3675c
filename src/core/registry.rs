//! Roots keyed by entry-point identity

use crate::compiler::CompilerFactory;
use crate::core::ids::id_to_path;
use crate::core::Root;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Shared handle to one root. Holding the lock serializes `generate` calls
/// for that entry point while other roots proceed.
pub type RootHandle = Arc<Mutex<Root>>;

/// Every live root of a build session.
///
/// Roots are keyed by the entry point's absolute path with the query string
/// removed; the root itself keeps the original id for reading.
pub struct RootRegistry {
    base: PathBuf,
    factory: Arc<dyn CompilerFactory>,
    roots: Mutex<HashMap<PathBuf, RootHandle>>,
}

impl RootRegistry {
    pub fn new(base: impl Into<PathBuf>, factory: Arc<dyn CompilerFactory>) -> Self {
        Self {
            base: base.into(),
            factory,
            roots: Mutex::new(HashMap::new()),
        }
    }

    /// The root for `id`, created on first use
    pub fn get(&self, id: &str) -> RootHandle {
        let key = id_to_path(id);
        let mut roots = self.roots.lock().unwrap_or_else(|e| e.into_inner());
        roots
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(id, "new root");
                Arc::new(Mutex::new(Root::new(id, &self.base, self.factory.clone())))
            })
            .clone()
    }

    /// The root for `id` if one exists
    pub fn lookup(&self, id: &str) -> Option<RootHandle> {
        let roots = self.roots.lock().unwrap_or_else(|e| e.into_inner());
        roots.get(&id_to_path(id)).cloned()
    }

    /// Drop the root for `id`
    pub fn evict(&self, id: &str) -> bool {
        let mut roots = self.roots.lock().unwrap_or_else(|e| e.into_inner());
        let removed = roots.remove(&id_to_path(id)).is_some();
        if removed {
            tracing::debug!(id, "evicted root");
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.roots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
