//! Host plugin boundary
//!
//! A bundler drives the cache through two hooks. The scan hook receives
//! every module the host processes and records its candidates in the
//! session's module-graph store. The load hook receives style sheets; it
//! waits for the scan phase to finish, then generates CSS through the
//! root registry.

mod barrier;
mod filter;

pub use barrier::ScanPhase;
pub use filter::{is_module_graph_file, is_potential_css_root_file};

use crate::candidates::{ModuleGraphStore, SharedCandidateIndex};
use crate::compiler::CompilerFactory;
use crate::core::ids::id_to_path;
use crate::core::{Generated, RootRegistry};
use crate::error::{BuildError, Result};
use crate::instrumentation::Instrumentation;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// How the host should treat returned contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Css,
}

/// Result of the load hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    /// Not ours: the host loads the file as usual
    Pass,
    /// Generated contents replacing the file
    Css { contents: String, loader: Loader },
}

/// Per-session plugin state shared by both hooks
pub struct Plugin {
    store: Arc<ModuleGraphStore>,
    shared: SharedCandidateIndex,
    registry: RootRegistry,
    debug: bool,
}

impl Plugin {
    pub const NAME: &'static str = "tw-incremental";

    pub fn new(
        project_root: impl Into<PathBuf>,
        factory: Arc<dyn CompilerFactory>,
        debug: bool,
    ) -> Self {
        let store = Arc::new(ModuleGraphStore::new());
        Self {
            shared: SharedCandidateIndex::new(store.clone()),
            store,
            registry: RootRegistry::new(project_root, factory),
            debug,
        }
    }

    pub fn registry(&self) -> &RootRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ModuleGraphStore {
        &self.store
    }

    /// Scan hook. Returns false when `id` is outside the scan filter.
    pub fn on_before_parse(&self, id: &str, contents: &str) -> bool {
        if !is_module_graph_file(id) {
            return false;
        }
        self.store.on_before_parse(id, contents);
        true
    }

    /// Load hook for style sheets.
    ///
    /// `defer` is called after the file has been read and before anything
    /// is generated; the host blocks in it until the scan phase is over.
    pub fn on_load<D>(&self, id: &str, defer: D) -> Result<LoadResult>
    where
        D: FnOnce(),
    {
        let mut instrumentation = Instrumentation::new(self.debug);
        self.load_with(id, defer, &mut instrumentation)
    }

    /// [`on_load`](Plugin::on_load) recording phases into a caller-owned
    /// instrumentation
    pub fn load_with<D>(
        &self,
        id: &str,
        defer: D,
        instrumentation: &mut Instrumentation,
    ) -> Result<LoadResult>
    where
        D: FnOnce(),
    {
        if !is_potential_css_root_file(id) {
            return Ok(LoadResult::Pass);
        }

        instrumentation.start("Generate CSS");

        // Read before registering so an unreadable entry leaves no root behind
        let path = id_to_path(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                instrumentation.end("Generate CSS");
                return Err(BuildError::FileNotFound {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let handle = self.registry.get(id);

        defer();

        let generated = {
            let mut root = handle.lock().unwrap_or_else(|e| e.into_inner());
            root.generate(&content, || self.shared.get(), instrumentation)
        };
        instrumentation.end("Generate CSS");
        let generated = generated?;

        match generated {
            Generated::Css(contents) => Ok(LoadResult::Css {
                contents,
                loader: Loader::Css,
            }),
            Generated::NotARoot => {
                self.registry.evict(id);
                Ok(LoadResult::Pass)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::BasicCompiler;
    use tempfile::TempDir;

    fn plugin(temp: &TempDir) -> Plugin {
        Plugin::new(temp.path(), Arc::new(BasicCompiler::new()), false)
    }

    #[test]
    fn test_non_css_passes_through() {
        let temp = TempDir::new().unwrap();
        let plugin = plugin(&temp);
        let result = plugin.on_load("/project/app.ts", || {}).unwrap();
        assert_eq!(result, LoadResult::Pass);
        assert!(plugin.registry().is_empty());
    }

    #[test]
    fn test_scan_hook_filter() {
        let temp = TempDir::new().unwrap();
        let plugin = plugin(&temp);
        assert!(plugin.on_before_parse("/project/app.ts", "'flex'"));
        assert!(!plugin.on_before_parse("/project/index.css", ".flex {}"));
        assert_eq!(plugin.store().len(), 1);
    }

    #[test]
    fn test_defer_runs_before_generation() {
        let temp = TempDir::new().unwrap();
        let css = temp.path().join("app.css");
        fs::write(&css, "@import 'tailwindcss' source(none);").unwrap();
        let id = css.to_string_lossy().into_owned();
        let plugin = plugin(&temp);

        let mut deferred = false;
        let result = plugin.on_load(&id, || deferred = true).unwrap();
        assert!(deferred);
        assert!(matches!(result, LoadResult::Css { loader: Loader::Css, .. }));
    }

    #[test]
    fn test_not_a_root_is_evicted() {
        let temp = TempDir::new().unwrap();
        let css = temp.path().join("plain.css");
        fs::write(&css, ".a { color: red; }").unwrap();
        let id = css.to_string_lossy().into_owned();
        let plugin = plugin(&temp);

        let result = plugin.on_load(&id, || {}).unwrap();
        assert_eq!(result, LoadResult::Pass);
        assert!(!plugin.registry().contains(&id));
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let id = temp.path().join("gone.css").to_string_lossy().into_owned();
        let plugin = plugin(&temp);

        let result = plugin.on_load(&id, || {});
        assert!(matches!(result, Err(BuildError::FileNotFound { .. })));
        assert!(!plugin.registry().contains(&id));
    }

    #[test]
    fn test_failed_generation_still_closes_phase() {
        let temp = TempDir::new().unwrap();
        let css = temp.path().join("app.css");
        fs::write(&css, "@import 'tailwindcss' source('./missing');").unwrap();
        let id = css.to_string_lossy().into_owned();
        let plugin = Plugin::new(temp.path(), Arc::new(BasicCompiler::new()), true);

        let mut instrumentation = Instrumentation::new(true);
        let result = plugin.load_with(&id, || {}, &mut instrumentation);

        assert!(matches!(result, Err(BuildError::InvalidSourceRoot { .. })));
        let labels: Vec<_> = instrumentation.phases().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels.last(), Some(&"Generate CSS"));
    }
}
