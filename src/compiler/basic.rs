//! Directive-level style-sheet compiler
//!
//! Understands just enough of the at-rule surface to drive the build cache:
//! utility imports and `@tailwind utilities`, `source(…)` roots, `@source`,
//! `@config`/`@plugin`, relative `@import` inlining, `@apply` and `theme(…)`.
//! Utility generation covers a small fixed table.

use crate::compiler::{
    CompileOptions, Compiler, CompilerFactory, Features, SourceDescriptor, SourceRoot,
};
use crate::core::ids::normalize_path;
use crate::error::{BuildError, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Deepest chain of relative `@import`s followed before giving up
const MAX_IMPORT_DEPTH: usize = 32;

/// Single-declaration utilities
const STATIC_UTILITIES: &[(&str, &str, &str)] = &[
    ("block", "display", "block"),
    ("inline", "display", "inline"),
    ("inline-block", "display", "inline-block"),
    ("flex", "display", "flex"),
    ("grid", "display", "grid"),
    ("hidden", "display", "none"),
    ("underline", "text-decoration-line", "underline"),
    ("line-through", "text-decoration-line", "line-through"),
    ("italic", "font-style", "italic"),
    ("uppercase", "text-transform", "uppercase"),
    ("lowercase", "text-transform", "lowercase"),
    ("font-normal", "font-weight", "400"),
    ("font-medium", "font-weight", "500"),
    ("font-bold", "font-weight", "700"),
];

/// Spacing utilities and the properties they set
const SPACING_UTILITIES: &[(&str, &[&str])] = &[
    ("m", &["margin"]),
    ("mx", &["margin-left", "margin-right"]),
    ("my", &["margin-top", "margin-bottom"]),
    ("mt", &["margin-top"]),
    ("mr", &["margin-right"]),
    ("mb", &["margin-bottom"]),
    ("ml", &["margin-left"]),
    ("p", &["padding"]),
    ("px", &["padding-left", "padding-right"]),
    ("py", &["padding-top", "padding-bottom"]),
    ("pt", &["padding-top"]),
    ("pr", &["padding-right"]),
    ("pb", &["padding-bottom"]),
    ("pl", &["padding-left"]),
    ("gap", &["gap"]),
];

/// Declarations generated for `candidate`, if it is a known utility
fn utility_declarations(candidate: &str) -> Option<Vec<(&'static str, String)>> {
    if let Some((_, property, value)) = STATIC_UTILITIES
        .iter()
        .find(|(name, _, _)| *name == candidate)
    {
        return Some(vec![(*property, value.to_string())]);
    }

    let (prefix, amount) = candidate.rsplit_once('-')?;
    let (_, properties) = SPACING_UTILITIES
        .iter()
        .find(|(name, _)| *name == prefix)?;
    let steps: f64 = amount.parse().ok()?;
    if !steps.is_finite() || steps < 0.0 {
        return None;
    }
    let value = if steps == 0.0 {
        "0px".to_string()
    } else {
        format!("{}rem", steps * 0.25)
    };
    Some(properties.iter().map(|p| (*p, value.clone())).collect())
}

/// Escape a class name for use in a selector
fn escape_class(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Split `"value" rest` or `'value' rest` into the value and the rest
fn parse_quoted(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    let quote = input.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &input[1..];
    let end = body.find(quote)?;
    Some((&body[..end], body[end + 1..].trim()))
}

/// The remainder of `statement` after the at-rule `name`, if it is one
fn strip_at_rule<'a>(statement: &'a str, name: &str) -> Option<&'a str> {
    let rest = statement.strip_prefix(name)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn is_utilities_import(target: &str) -> bool {
    let target = target.strip_suffix(".css").unwrap_or(target);
    target == "tailwindcss" || target == "tailwindcss/utilities"
}

/// Path of `to` relative to the directory `from`, both absolute
fn relative_to(to: &Path, from: &Path) -> PathBuf {
    let to: Vec<Component> = to.components().collect();
    let from: Vec<Component> = from.components().collect();
    let shared = to.iter().zip(&from).take_while(|(a, b)| a == b).count();

    let mut out = PathBuf::new();
    for _ in shared..from.len() {
        out.push("..");
    }
    for component in &to[shared..] {
        out.push(component.as_os_str());
    }
    out
}

/// Rewrite relative `url(…)` references in a line inlined from `from_base`
/// so they stay correct relative to `to_base`.
fn rewrite_urls(line: &str, from_base: &Path, to_base: &Path) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find("url(") {
        let (before, after) = rest.split_at(start + 4);
        out.push_str(before);

        let Some(close) = after.find(')') else {
            rest = after;
            break;
        };
        let raw = after[..close].trim();
        let (quote, target) = match raw.chars().next() {
            Some(q @ ('"' | '\'')) if raw.len() >= 2 && raw.ends_with(q) => {
                (Some(q), &raw[1..raw.len() - 1])
            }
            _ => (None, raw),
        };

        if target.starts_with("./") || target.starts_with("../") {
            let absolute = normalize_path(&from_base.join(target));
            let mut rewritten = relative_to(&absolute, to_base)
                .to_string_lossy()
                .replace('\\', "/");
            if !rewritten.starts_with("../") {
                rewritten.insert_str(0, "./");
            }
            match quote {
                Some(q) => {
                    out.push(q);
                    out.push_str(&rewritten);
                    out.push(q);
                }
                None => out.push_str(&rewritten),
            }
        } else {
            out.push_str(&after[..close]);
        }
        rest = &after[close..];
    }

    out.push_str(rest);
    out
}

/// One piece of the compiled output
#[derive(Debug, Clone)]
enum Chunk {
    Text(String),
    Utilities,
}

/// A style sheet compiled by [`BasicCompiler`]
#[derive(Debug)]
pub struct CompiledSheet {
    root: SourceRoot,
    sources: Vec<SourceDescriptor>,
    features: Features,
    chunks: Vec<Chunk>,
}

impl Compiler for CompiledSheet {
    fn root(&self) -> &SourceRoot {
        &self.root
    }

    fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    fn features(&self) -> Features {
        self.features
    }

    fn build(&self, candidates: &[String]) -> String {
        // Sorting makes the output independent of candidate order
        let ordered: BTreeSet<&str> = candidates.iter().map(String::as_str).collect();

        let mut out = String::new();
        let mut emitted = false;
        for chunk in &self.chunks {
            match chunk {
                Chunk::Text(text) => {
                    out.push_str(text);
                    out.push('\n');
                }
                Chunk::Utilities if !emitted => {
                    emitted = true;
                    for candidate in &ordered {
                        let Some(declarations) = utility_declarations(candidate) else {
                            continue;
                        };
                        out.push('.');
                        out.push_str(&escape_class(candidate));
                        out.push_str(" {\n");
                        for (property, value) in declarations {
                            out.push_str(&format!("  {}: {};\n", property, value));
                        }
                        out.push_str("}\n");
                    }
                }
                Chunk::Utilities => {}
            }
        }
        out
    }
}

/// A module read from disk, with the mtime it had when it was read
#[derive(Debug, Clone)]
struct CachedModule {
    mtime: SystemTime,
    content: Arc<str>,
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Compiler factory with a content cache for every file it reads.
///
/// The cache is shared by every root compiled through this factory. An
/// entry is only served while the file still has the mtime it was read at.
#[derive(Debug, Default)]
pub struct BasicCompiler {
    modules: Mutex<HashMap<PathBuf, CachedModule>>,
}

impl BasicCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently held in the module cache
    pub fn cached_modules(&self) -> usize {
        self.modules.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn read_module(&self, path: &Path) -> Result<Arc<str>> {
        let mut modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        let mtime = modified(path);
        if let (Some(cached), Some(mtime)) = (modules.get(path), mtime) {
            if cached.mtime == mtime {
                return Ok(cached.content.clone());
            }
        }

        let content: Arc<str> = match fs::read_to_string(path) {
            Ok(content) => content.into(),
            Err(e) => {
                modules.remove(path);
                return Err(BuildError::Compile {
                    path: path.display().to_string(),
                    reason: format!("cannot read module: {}", e),
                });
            }
        };
        match mtime {
            Some(mtime) => {
                modules.insert(
                    path.to_path_buf(),
                    CachedModule {
                        mtime,
                        content: content.clone(),
                    },
                );
            }
            None => {
                modules.remove(path);
            }
        }
        Ok(content)
    }
}

impl CompilerFactory for BasicCompiler {
    fn compile(
        &self,
        content: &str,
        options: &CompileOptions,
        on_dependency: &mut dyn FnMut(PathBuf),
    ) -> Result<Box<dyn Compiler>> {
        let mut parser = Parser {
            compiler: self,
            options,
            on_dependency,
            sheet: CompiledSheet {
                root: SourceRoot::Auto,
                sources: Vec::new(),
                features: Features::NONE,
                chunks: Vec::new(),
            },
        };
        parser.process(content, &options.base, 0)?;
        Ok(Box::new(parser.sheet))
    }

    fn invalidate(&self, paths: &[PathBuf]) {
        let mut modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        for path in paths {
            modules.remove(path);
        }
    }
}

struct Parser<'a, 'd> {
    compiler: &'a BasicCompiler,
    options: &'a CompileOptions,
    on_dependency: &'d mut dyn FnMut(PathBuf),
    sheet: CompiledSheet,
}

impl Parser<'_, '_> {
    fn error(&self, base: &Path, reason: impl Into<String>) -> BuildError {
        BuildError::Compile {
            path: base.display().to_string(),
            reason: reason.into(),
        }
    }

    fn process(&mut self, content: &str, base: &Path, depth: usize) -> Result<()> {
        if depth > MAX_IMPORT_DEPTH {
            return Err(self.error(base, "@import nesting too deep (import cycle?)"));
        }

        for line in content.lines() {
            let statement = line.trim().trim_end_matches(';').trim_end();

            if let Some(rest) = strip_at_rule(statement, "@import") {
                let (target, tail) = parse_quoted(rest)
                    .ok_or_else(|| self.error(base, format!("malformed `{}`", statement)))?;

                if is_utilities_import(target) {
                    self.sheet.features |= Features::UTILITIES;
                    self.sheet.root = parse_source_root(tail, base)
                        .ok_or_else(|| self.error(base, format!("malformed `{}`", statement)))?;
                    self.sheet.chunks.push(Chunk::Utilities);
                } else if target.starts_with("tailwindcss/") {
                    // Theme and preflight layers carry nothing this compiler emits
                } else if target.starts_with('.') || target.starts_with('/') {
                    let path = normalize_path(&base.join(target));
                    (self.on_dependency)(path.clone());
                    let imported = self.compiler.read_module(&path)?;
                    let import_base = path.parent().unwrap_or(base).to_path_buf();
                    self.process(&imported, &import_base, depth + 1)?;
                } else {
                    self.push_text(line, base);
                }
            } else if let Some(rest) = strip_at_rule(statement, "@tailwind") {
                if rest == "utilities" {
                    self.sheet.features |= Features::UTILITIES;
                    self.sheet.chunks.push(Chunk::Utilities);
                }
            } else if let Some(rest) = strip_at_rule(statement, "@source") {
                let (negated, rest) = match strip_at_rule(rest, "not") {
                    Some(rest) => (true, rest),
                    None => (false, rest),
                };
                let (pattern, _) = parse_quoted(rest)
                    .ok_or_else(|| self.error(base, format!("malformed `{}`", statement)))?;
                self.sheet.sources.push(SourceDescriptor {
                    base: base.to_path_buf(),
                    pattern: pattern.to_string(),
                    negated,
                });
            } else if let Some(rest) = strip_at_rule(statement, "@config")
                .or_else(|| strip_at_rule(statement, "@plugin"))
            {
                let (target, _) = parse_quoted(rest)
                    .ok_or_else(|| self.error(base, format!("malformed `{}`", statement)))?;
                let path = normalize_path(&base.join(target));
                (self.on_dependency)(path.clone());
                self.compiler.read_module(&path)?;
                self.sheet.features |= Features::JS_PLUGIN_COMPAT;
            } else if let Some(rest) = strip_at_rule(statement, "@apply") {
                self.sheet.features |= Features::AT_APPLY;
                let indent = &line[..line.len() - line.trim_start().len()];
                for utility in rest.split_whitespace() {
                    let declarations = utility_declarations(utility).ok_or_else(|| {
                        self.error(
                            base,
                            format!("Cannot apply unknown utility class `{}`", utility),
                        )
                    })?;
                    for (property, value) in declarations {
                        self.sheet
                            .chunks
                            .push(Chunk::Text(format!("{}{}: {};", indent, property, value)));
                    }
                }
            } else {
                if line.contains("theme(") {
                    self.sheet.features |= Features::THEME_FUNCTION;
                }
                self.push_text(line, base);
            }
        }

        Ok(())
    }

    fn push_text(&mut self, line: &str, base: &Path) {
        let text = if self.options.should_rewrite_urls && base != self.options.base {
            rewrite_urls(line, base, &self.options.base)
        } else {
            line.to_string()
        };
        self.sheet.chunks.push(Chunk::Text(text));
    }
}

/// Root declared after a utilities import: `source(none)`, `source("dir")`
/// or nothing. Returns None for a malformed `source(…)`.
fn parse_source_root(tail: &str, base: &Path) -> Option<SourceRoot> {
    let Some(start) = tail.find("source(") else {
        return Some(SourceRoot::Auto);
    };
    let inner = &tail[start + "source(".len()..];
    let inner = inner[..inner.find(')')?].trim();

    if inner == "none" {
        return Some(SourceRoot::None);
    }

    let (pattern, _) = parse_quoted(inner)?;
    Some(SourceRoot::Explicit {
        base: base.to_path_buf(),
        pattern: pattern.to_string(),
    })
}
