//! Out-of-band scan results keyed by module id

use crate::scanner::extract_candidates;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Candidates found in one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedModule {
    pub id: String,
    pub candidates: Vec<String>,
}

/// Producer side of the shared candidate index
pub trait ExternalScanStore: Send + Sync {
    /// Whether anything was recorded since the last pull
    fn is_dirty(&self) -> bool;

    /// Every module recorded so far. Marks the store clean.
    fn pull(&self) -> Vec<ScannedModule>;
}

/// Scan store fed by the host's "scan everything" hook.
///
/// Every record bumps a generation counter; the store is dirty while that
/// counter differs from the generation seen by the last pull.
#[derive(Debug, Default)]
pub struct ModuleGraphStore {
    modules: Mutex<HashMap<String, Vec<String>>>,
    generation: AtomicU64,
    pulled: AtomicU64,
}

impl ModuleGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract candidates from a module's contents and record them
    pub fn on_before_parse(&self, id: &str, contents: &str) {
        let candidates = extract_candidates(contents);
        self.record(id, candidates);
    }

    /// Replace the candidates recorded for `id`
    pub fn record(&self, id: &str, candidates: Vec<String>) {
        let mut modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        modules.insert(id.to_string(), candidates);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.modules.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExternalScanStore for ModuleGraphStore {
    fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.pulled.load(Ordering::SeqCst)
    }

    fn pull(&self) -> Vec<ScannedModule> {
        let modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        // Read under the lock so no record can slip in between
        let generation = self.generation.load(Ordering::SeqCst);
        let pulled = modules
            .iter()
            .map(|(id, candidates)| ScannedModule {
                id: id.clone(),
                candidates: candidates.clone(),
            })
            .collect();
        self.pulled.store(generation, Ordering::SeqCst);
        pulled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_until_pulled() {
        let store = ModuleGraphStore::new();
        assert!(!store.is_dirty());

        store.on_before_parse("/project/app.ts", r#"el.className = "flex""#);
        assert!(store.is_dirty());

        let pulled = store.pull();
        assert!(!store.is_dirty());
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].id, "/project/app.ts");
        assert!(pulled[0].candidates.contains(&"flex".to_string()));
    }

    #[test]
    fn test_record_overwrites_entry() {
        let store = ModuleGraphStore::new();
        store.record("a", vec!["flex".to_string()]);
        store.record("a", vec!["grid".to_string()]);

        let pulled = store.pull();
        assert_eq!(
            pulled,
            vec![ScannedModule {
                id: "a".to_string(),
                candidates: vec!["grid".to_string()],
            }]
        );
    }

    #[test]
    fn test_pull_returns_everything_every_time() {
        let store = ModuleGraphStore::new();
        store.record("a", vec!["flex".to_string()]);
        store.pull();
        store.record("b", vec!["grid".to_string()]);

        assert_eq!(store.pull().len(), 2);
        assert_eq!(store.len(), 2);
    }
}
