//! Configuration types for tw-incremental

use std::path::PathBuf;

/// Output format for the build report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable console output
    #[default]
    Console,
    /// JSON output with structured data
    Json,
}

/// Configuration options for a build session
#[derive(Debug, Clone)]
pub struct Config {
    /// Project base used when a style sheet declares no explicit source root
    pub project_root: PathBuf,

    /// Style-sheet entry points to load, in order
    pub entries: Vec<String>,

    /// File listing module-graph files to feed the out-of-band scan
    /// (one per line, "-" for stdin). None scans nothing out of band.
    pub module_list: Option<String>,

    /// Output directory for generated CSS (or "-" to print the report only)
    pub output: String,

    /// File the build report is written to ("-" for stdout)
    pub report_filename: String,

    /// Report format (console or json)
    pub output_format: OutputFormat,

    /// Number of threads for parallel stat and scan work (default: num_cpus)
    pub num_threads: usize,

    /// Emit per-phase timings for every generated style sheet
    pub debug: bool,

    /// Extra load passes run against the same session to exercise warm reuse
    pub watch_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            entries: Vec::new(),
            module_list: None,
            output: String::from("-"),
            report_filename: String::from("-"),
            output_format: OutputFormat::Console,
            num_threads: num_cpus::get(),
            debug: debug_from_env(),
            watch_rounds: 0,
        }
    }
}

impl Config {
    /// Whether generated CSS should be written to disk
    pub fn writes_css(&self) -> bool {
        self.output != "-"
    }
}

/// Read the `DEBUG` environment variable the way the host tooling does:
/// any non-empty value other than "0" or "false" turns instrumentation on.
pub fn debug_from_env() -> bool {
    std::env::var("DEBUG")
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("*"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("FALSE"));
    }

    #[test]
    fn test_writes_css() {
        let mut config = Config::default();
        assert!(!config.writes_css());

        config.output = "dist".to_string();
        assert!(config.writes_css());
    }
}
