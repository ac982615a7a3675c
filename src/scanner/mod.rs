//! File-system candidate scanner
//!
//! A scanner is built from the source descriptors a compiled style sheet
//! declares. Each call to [`Scanner::scan`] walks the matching files and
//! returns every candidate found in them. Files whose modification time is
//! unchanged since the previous scan are not read again.

mod extract;

pub use extract::extract_candidates;

use crate::compiler::SourceDescriptor;
use crate::core::ids::normalize_path;
use crate::error::{BuildError, Result};
use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Extensions never scanned for candidates
const IGNORED_EXTENSIONS: &[&str] = &[
    "css", "less", "sass", "scss", "styl", "lock", "png", "jpg", "jpeg", "gif", "webp", "avif",
    "ico", "woff", "woff2", "ttf", "otf", "eot", "mp4", "webm", "zip", "gz", "pdf", "wasm", "node",
];

/// Directories never descended into
const IGNORED_DIRS: &[&str] = &["node_modules", ".git", ".hg", ".svn"];

/// One compiled source descriptor
#[derive(Debug)]
struct CompiledSource {
    base: PathBuf,
    matcher: GlobMatcher,
}

/// Move the static directory part of `pattern` into `base`.
///
/// A pattern without glob characters names a directory (scan everything
/// below it) or a single file.
fn split_source(base: &Path, pattern: &str) -> (PathBuf, String) {
    match pattern.find(['*', '?', '{', '[']) {
        None => {
            let full = normalize_path(&base.join(pattern));
            match (full.is_file(), full.parent(), full.file_name()) {
                (true, Some(parent), Some(name)) => {
                    (parent.to_path_buf(), name.to_string_lossy().into_owned())
                }
                _ => (full, "**/*".to_string()),
            }
        }
        Some(glob_at) => match pattern[..glob_at].rfind('/') {
            Some(slash) => (
                normalize_path(&base.join(&pattern[..slash])),
                pattern[slash + 1..].to_string(),
            ),
            None => (normalize_path(base), pattern.to_string()),
        },
    }
}

impl CompiledSource {
    fn new(source: &SourceDescriptor) -> Result<Self> {
        let (base, pattern) = split_source(&source.base, &source.pattern);
        let matcher = Glob::new(&pattern)
            .map_err(|e| BuildError::Glob(format!("'{}': {}", source.pattern, e)))?
            .compile_matcher();
        Ok(Self { base, matcher })
    }

    fn matches(&self, path: &Path) -> bool {
        path.strip_prefix(&self.base)
            .map(|relative| self.matcher.is_match(relative))
            .unwrap_or(false)
    }
}

/// Candidates extracted from one file at a known modification time
#[derive(Debug, Clone)]
struct ScannedFile {
    mtime: Option<SystemTime>,
    candidates: Arc<Vec<String>>,
}

/// Scans the files selected by a set of source descriptors
#[derive(Debug)]
pub struct Scanner {
    sources: Vec<SourceDescriptor>,
    include: Vec<CompiledSource>,
    exclude: Vec<CompiledSource>,
    files: HashMap<PathBuf, ScannedFile>,
}

impl Scanner {
    /// Create a scanner for the given sources
    ///
    /// # Returns
    /// A Scanner, or an error if a pattern is not a valid glob
    pub fn new(sources: Vec<SourceDescriptor>) -> Result<Self> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for source in &sources {
            let compiled = CompiledSource::new(source)?;
            if source.negated {
                exclude.push(compiled);
            } else {
                include.push(compiled);
            }
        }

        Ok(Self {
            sources,
            include,
            exclude,
            files: HashMap::new(),
        })
    }

    /// The descriptors this scanner was built from
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Files seen by the most recent scan
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Scan every matching file and return all candidates found.
    ///
    /// The result covers the complete file set on every call, so calling it
    /// again is always safe. Unreadable files contribute nothing.
    pub fn scan(&mut self) -> Vec<String> {
        let paths = self.discover();

        let stale: Vec<(PathBuf, Option<SystemTime>)> = paths
            .iter()
            .filter_map(|path| {
                let mtime = modified(path);
                match self.files.get(path) {
                    Some(cached) if mtime.is_some() && cached.mtime == mtime => None,
                    _ => Some((path.clone(), mtime)),
                }
            })
            .collect();

        let fresh: Vec<(PathBuf, ScannedFile)> = stale
            .into_par_iter()
            .filter_map(|(path, mtime)| {
                let content = fs::read_to_string(&path).ok()?;
                let candidates = Arc::new(extract_candidates(&content));
                Some((path, ScannedFile { mtime, candidates }))
            })
            .collect();

        tracing::debug!(
            files = paths.len(),
            extracted = fresh.len(),
            "scanned sources"
        );

        self.files.retain(|path, _| paths.contains(path));
        self.files.extend(fresh);

        let mut seen = HashSet::new();
        self.files
            .values()
            .flat_map(|file| file.candidates.iter())
            .filter(|candidate| seen.insert(candidate.as_str()))
            .cloned()
            .collect()
    }

    /// Walk every include base and collect the files that match
    fn discover(&self) -> BTreeSet<PathBuf> {
        let mut found = BTreeSet::new();

        for source in &self.include {
            if !source.base.is_dir() {
                continue;
            }

            let walker = WalkBuilder::new(&source.base)
                .hidden(false)
                .filter_entry(|entry| {
                    entry
                        .file_name()
                        .to_str()
                        .map_or(true, |name| !IGNORED_DIRS.contains(&name))
                })
                .build();

            for entry in walker.flatten() {
                if !entry.file_type().map_or(false, |t| t.is_file()) {
                    continue;
                }
                let path = entry.into_path();
                if is_ignored_extension(&path) || !source.matches(&path) {
                    continue;
                }
                if self.exclude.iter().any(|ex| ex.matches(&path)) {
                    continue;
                }
                found.insert(path);
            }
        }

        found
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn is_ignored_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            IGNORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
}
