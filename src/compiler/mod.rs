//! Compiler contract consumed by the build cache
//!
//! The style-sheet compiler is a black box: it is constructed from the
//! contents of an entry point, reports which files it read along the way,
//! declares where candidates should be scanned for, and turns a candidate
//! list into CSS text.

mod basic;

pub use basic::BasicCompiler;

use crate::core::ids::normalize_path;
use crate::error::Result;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

/// Set of language features a compiled style sheet makes use of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Features(u32);

impl Features {
    pub const NONE: Features = Features(0);
    /// `@apply` was used
    pub const AT_APPLY: Features = Features(1 << 0);
    /// `@config` or `@plugin` was used
    pub const JS_PLUGIN_COMPAT: Features = Features(1 << 1);
    /// `theme(…)` was used
    pub const THEME_FUNCTION: Features = Features(1 << 2);
    /// Utility generation was requested
    pub const UTILITIES: Features = Features(1 << 3);

    /// Features that make a style sheet worth generating at all
    pub const ROOT_FEATURES: Features = Features(
        Self::AT_APPLY.0 | Self::JS_PLUGIN_COMPAT.0 | Self::THEME_FUNCTION.0 | Self::UTILITIES.0,
    );

    pub fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Features) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        Features(self.0 | rhs.0)
    }
}

impl BitOrAssign for Features {
    fn bitor_assign(&mut self, rhs: Features) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Features {
    type Output = Features;

    fn bitand(self, rhs: Features) -> Features {
        Features(self.0 & rhs.0)
    }
}

/// A glob-based rule describing where to scan for candidates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceDescriptor {
    /// Directory the pattern is relative to
    pub base: PathBuf,
    /// Glob pattern, relative to `base`
    pub pattern: String,
    /// Matching files are excluded instead of included
    pub negated: bool,
}

impl SourceDescriptor {
    pub fn new(base: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            pattern: pattern.into(),
            negated: false,
        }
    }

    pub fn negated(base: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            negated: true,
            ..Self::new(base, pattern)
        }
    }
}

/// The root a compiled style sheet declares for automatic source detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRoot {
    /// `source(none)`: automatic detection is disabled
    None,
    /// Nothing declared: fall back to the project base
    Auto,
    /// `source("…")`: scan below an explicit base
    Explicit { base: PathBuf, pattern: String },
}

impl SourceRoot {
    /// Source descriptors this root contributes to the scanner
    pub fn descriptors(&self, project_base: &Path) -> Vec<SourceDescriptor> {
        match self {
            SourceRoot::None => Vec::new(),
            SourceRoot::Auto => vec![SourceDescriptor::new(project_base, "**/*")],
            SourceRoot::Explicit { base, pattern } => {
                vec![SourceDescriptor::new(base.clone(), pattern.clone())]
            }
        }
    }

    /// Resolved directory an explicit root points at
    pub fn explicit_base(&self) -> Option<PathBuf> {
        match self {
            SourceRoot::Explicit { base, pattern } => Some(normalize_path(&base.join(pattern))),
            _ => None,
        }
    }
}

/// Options passed to the compiler for one entry point
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Directory relative imports are resolved against
    pub base: PathBuf,
    /// Rewrite relative `url(…)` references in inlined imports
    pub should_rewrite_urls: bool,
}

/// A compiled style sheet
pub trait Compiler: Send {
    /// Declared root for automatic source detection
    fn root(&self) -> &SourceRoot;

    /// Additional declared sources (`@source`)
    fn sources(&self) -> &[SourceDescriptor];

    /// Features used by the style sheet
    fn features(&self) -> Features;

    /// Generate CSS for the given candidates.
    ///
    /// Output must not depend on the order of `candidates`.
    fn build(&self, candidates: &[String]) -> String;
}

/// Constructs compilers from style-sheet contents
pub trait CompilerFactory: Send + Sync {
    /// Compile `content`, calling `on_dependency` once for every file the
    /// compiler had to read (imports, configs, plugins).
    fn compile(
        &self,
        content: &str,
        options: &CompileOptions,
        on_dependency: &mut dyn FnMut(PathBuf),
    ) -> Result<Box<dyn Compiler>>;

    /// Drop any module state cached for `paths` so the next compile reads
    /// them fresh.
    fn invalidate(&self, _paths: &[PathBuf]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_intersects_root_features() {
        assert!(!Features::NONE.intersects(Features::ROOT_FEATURES));
        assert!(Features::AT_APPLY.intersects(Features::ROOT_FEATURES));
        assert!(Features::THEME_FUNCTION.intersects(Features::ROOT_FEATURES));

        let both = Features::UTILITIES | Features::AT_APPLY;
        assert!(both.contains(Features::UTILITIES));
        assert!(!both.contains(Features::THEME_FUNCTION));
    }

    #[test]
    fn test_root_descriptors() {
        let project = Path::new("/project");

        assert!(SourceRoot::None.descriptors(project).is_empty());
        assert_eq!(
            SourceRoot::Auto.descriptors(project),
            vec![SourceDescriptor::new("/project", "**/*")]
        );

        let explicit = SourceRoot::Explicit {
            base: PathBuf::from("/project/app"),
            pattern: "../src".to_string(),
        };
        assert_eq!(
            explicit.descriptors(project),
            vec![SourceDescriptor::new("/project/app", "../src")]
        );
        assert_eq!(explicit.explicit_base(), Some(PathBuf::from("/project/src")));
    }
}
