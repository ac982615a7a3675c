//! Incremental state for one style-sheet entry point

use crate::cache::DependencyTracker;
use crate::candidates::{module_graph_candidates, SharedCandidates};
use crate::compiler::{CompileOptions, Compiler, CompilerFactory, Features};
use crate::core::ids::id_to_path;
use crate::error::{BuildError, Result};
use crate::instrumentation::Instrumentation;
use crate::scanner::Scanner;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of [`Root::generate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    /// Generated CSS text
    Css(String),
    /// The style sheet uses none of the features that make it a root; the
    /// caller should drop this root.
    NotARoot,
}

/// The unit of incremental state for one style-sheet entry point.
///
/// A root is cold until its first [`generate`](Root::generate) builds a
/// compiler and scanner. It stays warm across later calls until one of its
/// build dependencies changes, at which point both are rebuilt and the
/// candidates collected so far are dropped.
pub struct Root {
    /// Module id of the entry point, query string included
    id: String,
    /// Project base used when the style sheet declares no source root
    base: PathBuf,
    factory: Arc<dyn CompilerFactory>,

    compiler: Option<Box<dyn Compiler>>,
    scanner: Option<Scanner>,

    /// Everything the scanner returned since the compiler was last built
    candidates: HashSet<String>,

    build_dependencies: DependencyTracker,

    /// Number of times the compiler has been (re)built
    builds: usize,
}

impl Root {
    pub fn new(
        id: impl Into<String>,
        base: impl Into<PathBuf>,
        factory: Arc<dyn CompilerFactory>,
    ) -> Self {
        Self {
            id: id.into(),
            base: base.into(),
            factory,
            compiler: None,
            scanner: None,
            candidates: HashSet::new(),
            build_dependencies: DependencyTracker::new(),
            builds: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether a compiler and scanner are currently cached
    pub fn is_warm(&self) -> bool {
        self.compiler.is_some() && self.scanner.is_some()
    }

    /// Candidates accumulated from this root's own scanner
    pub fn candidates(&self) -> &HashSet<String> {
        &self.candidates
    }

    pub fn build_count(&self) -> usize {
        self.builds
    }

    pub fn dependencies(&self) -> &DependencyTracker {
        &self.build_dependencies
    }

    /// Whether any recorded build dependency changed
    pub fn requires_build(&self) -> bool {
        self.build_dependencies.requires_build()
    }

    /// Generate the CSS for this root from the entry point's `content`.
    ///
    /// `get_shared_candidates` is called once, after local scanning, to read
    /// the module-graph candidates; only entries inside this root's source
    /// scope are merged, and they are not retained between calls.
    pub fn generate<F>(
        &mut self,
        content: &str,
        get_shared_candidates: F,
        instrumentation: &mut Instrumentation,
    ) -> Result<Generated>
    where
        F: FnOnce() -> SharedCandidates,
    {
        let input_path = id_to_path(&self.id);
        let input_base = input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base.clone());

        let requires_build = self.build_dependencies.requires_build();

        if !self.is_warm() || requires_build {
            self.rebuild(content, &input_path, input_base, instrumentation)?;
        }

        let (Some(compiler), Some(scanner)) = (self.compiler.as_ref(), self.scanner.as_mut())
        else {
            return Err(BuildError::Other(format!(
                "compiler for '{}' missing after rebuild",
                self.id
            )));
        };

        let features = compiler.features();
        if !features.intersects(Features::ROOT_FEATURES) {
            tracing::debug!(id = %self.id, "not a root");
            return Ok(Generated::NotARoot);
        }

        if features.contains(Features::UTILITIES) {
            instrumentation.start("Scan for candidates");
            self.candidates.extend(scanner.scan());
            instrumentation.end("Scan for candidates");

            if let Some(base_path) = compiler.root().explicit_base() {
                if !base_path.is_dir() {
                    return Err(BuildError::InvalidSourceRoot { path: base_path });
                }
            }
        }

        instrumentation.start("Merge module graph candidates");
        let mut all_candidates = self.candidates.clone();
        let shared = get_shared_candidates();
        all_candidates.extend(module_graph_candidates(compiler.root(), &shared));
        instrumentation.end("Merge module graph candidates");

        instrumentation.start("Build CSS");
        let candidates: Vec<String> = all_candidates.into_iter().collect();
        let css = compiler.build(&candidates);
        instrumentation.end("Build CSS");

        tracing::debug!(
            id = %self.id,
            local = self.candidates.len(),
            merged = candidates.len(),
            "generated css"
        );

        Ok(Generated::Css(css))
    }

    /// Throw away the cached compiler and scanner and build fresh ones
    fn rebuild(
        &mut self,
        content: &str,
        input_path: &Path,
        input_base: PathBuf,
        instrumentation: &mut Instrumentation,
    ) -> Result<()> {
        tracing::debug!(id = %self.id, warm = self.is_warm(), "building compiler");

        self.factory.invalidate(&self.build_dependencies.paths());
        self.build_dependencies.clear();
        // A failed compile below must leave the root cold
        self.compiler = None;
        self.scanner = None;
        self.candidates.clear();

        self.build_dependencies.add_build_dependency(input_path);

        instrumentation.start("Setup compiler");
        let options = CompileOptions {
            base: input_base,
            should_rewrite_urls: true,
        };
        let mut reported = Vec::new();
        let compiled = self
            .factory
            .compile(content, &options, &mut |path| reported.push(path));
        // Every dependency is stamped before scanning starts. Paths reported
        // by a failed compile are kept so the next rebuild invalidates them.
        self.build_dependencies.add_build_dependencies(reported);
        instrumentation.end("Setup compiler");
        let compiler = compiled?;

        instrumentation.start("Setup scanner");
        let mut sources = compiler.root().descriptors(&self.base);
        sources.extend(compiler.sources().iter().cloned());
        let scanner = Scanner::new(sources)?;
        instrumentation.end("Setup scanner");

        self.compiler = Some(compiler);
        self.scanner = Some(scanner);
        self.builds += 1;
        Ok(())
    }
}
