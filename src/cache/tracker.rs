//! Build dependency tracking by modification time

use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Last known modification time of a dependency.
///
/// `None` means the file could not be stat'ed when it was registered; such a
/// dependency is reported as changed on every check.
pub type Mtime = Option<SystemTime>;

/// Files a compiled style sheet depends on, with their last known mtimes
#[derive(Debug, Default)]
pub struct DependencyTracker {
    dependencies: HashMap<PathBuf, Mtime>,
}

fn stat_mtime(path: &Path) -> Mtime {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` with its current mtime, or as unknown if it cannot be
    /// stat'ed. Never fails.
    pub fn add_build_dependency(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mtime = stat_mtime(&path);
        self.dependencies.insert(path, mtime);
    }

    /// Record several dependencies at once.
    ///
    /// The stats run in parallel; every one has finished and been recorded
    /// by the time this returns.
    pub fn add_build_dependencies(&mut self, paths: Vec<PathBuf>) {
        let stamped: Vec<(PathBuf, Mtime)> = paths
            .into_par_iter()
            .map(|path| {
                let mtime = stat_mtime(&path);
                (path, mtime)
            })
            .collect();
        self.dependencies.extend(stamped);
    }

    /// Whether any tracked file changed since it was recorded.
    ///
    /// Unknown mtimes, files that can no longer be stat'ed and files with a
    /// strictly newer mtime all count as changed. Stops at the first change.
    pub fn requires_build(&self) -> bool {
        for (path, recorded) in &self.dependencies {
            let Some(recorded) = recorded else {
                tracing::debug!(path = %path.display(), "dependency has no known mtime");
                return true;
            };

            match stat_mtime(path) {
                Some(current) if current > *recorded => {
                    tracing::debug!(path = %path.display(), "dependency modified");
                    return true;
                }
                Some(_) => {}
                None => {
                    tracing::debug!(path = %path.display(), "dependency disappeared");
                    return true;
                }
            }
        }
        false
    }

    pub fn clear(&mut self) {
        self.dependencies.clear();
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.dependencies.contains_key(path)
    }

    /// Recorded mtime for `path`, if it is tracked
    pub fn mtime(&self, path: &Path) -> Option<Mtime> {
        self.dependencies.get(path).copied()
    }

    /// Every tracked path
    pub fn paths(&self) -> Vec<PathBuf> {
        self.dependencies.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch_forward(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        let later = SystemTime::now() + Duration::from_secs(10);
        file.set_modified(later).unwrap();
    }

    #[test]
    fn test_unchanged_does_not_require_build() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.css");
        fs::write(&path, "@import 'tailwindcss';").unwrap();

        let mut tracker = DependencyTracker::new();
        tracker.add_build_dependency(&path);

        assert!(tracker.mtime(&path).unwrap().is_some());
        assert!(!tracker.requires_build());
        assert!(!tracker.requires_build());
    }

    #[test]
    fn test_touched_requires_build() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.css");
        fs::write(&path, "a").unwrap();

        let mut tracker = DependencyTracker::new();
        tracker.add_build_dependency(&path);
        touch_forward(&path);

        assert!(tracker.requires_build());
    }

    #[test]
    fn test_deleted_requires_build() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("theme.css");
        fs::write(&path, "a").unwrap();

        let mut tracker = DependencyTracker::new();
        tracker.add_build_dependency(&path);
        fs::remove_file(&path).unwrap();

        assert!(tracker.requires_build());
    }

    #[test]
    fn test_missing_file_is_unknown_and_always_requires_build() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.js");

        let mut tracker = DependencyTracker::new();
        tracker.add_build_dependency(&path);

        assert_eq!(tracker.mtime(&path), Some(None));
        assert!(tracker.requires_build());

        // Creating the file does not help until it is re-registered
        fs::write(&path, "export default {}").unwrap();
        assert!(tracker.requires_build());

        tracker.add_build_dependency(&path);
        assert!(!tracker.requires_build());
    }

    #[test]
    fn test_add_build_dependencies_records_all() {
        let temp = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..16)
            .map(|i| {
                let p = temp.path().join(format!("dep{}.css", i));
                fs::write(&p, "x").unwrap();
                p
            })
            .collect();

        let mut tracker = DependencyTracker::new();
        tracker.add_build_dependencies(paths.clone());

        assert_eq!(tracker.len(), 16);
        assert!(paths.iter().all(|p| tracker.contains(p)));
        assert!(!tracker.requires_build());
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let mut tracker = DependencyTracker::new();
        tracker.add_build_dependency(temp.path().join("missing"));
        assert!(tracker.requires_build());

        tracker.clear();
        assert!(tracker.is_empty());
        assert!(!tracker.requires_build());
    }
}
