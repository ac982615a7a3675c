//! Session-wide, lazily materialized view of the external scan store

use crate::candidates::store::ExternalScanStore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Snapshot of the shared index: module id to its candidate set
pub type SharedCandidates = HashMap<String, Arc<HashSet<String>>>;

/// Shared candidate index for one build session.
///
/// Entries are only ever added or replaced, never removed. A replacement
/// swaps the whole set for a module, so readers see either the old or the
/// new set and never a mix.
pub struct SharedCandidateIndex {
    store: Arc<dyn ExternalScanStore>,
    entries: RwLock<SharedCandidates>,
}

impl SharedCandidateIndex {
    pub fn new(store: Arc<dyn ExternalScanStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Pull from the store if it is dirty and fold the result into the index
    pub fn materialize(&self) {
        if !self.store.is_dirty() {
            return;
        }

        // Held across the pull so a reader that finds the store clean also
        // finds the pulled entries in place
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if !self.store.is_dirty() {
            return;
        }

        let pulled = self.store.pull();
        tracing::debug!(modules = pulled.len(), "materialized shared candidates");

        for module in pulled {
            let set: HashSet<String> = module.candidates.into_iter().collect();
            entries.insert(module.id, Arc::new(set));
        }
    }

    /// Current contents of the index, without pulling
    pub fn snapshot(&self) -> SharedCandidates {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Materialize if needed, then return the current contents
    pub fn get(&self) -> SharedCandidates {
        self.materialize();
        self.snapshot()
    }
}
