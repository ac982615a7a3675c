//! CLI argument parsing using clap

use crate::config::{debug_from_env, Config, OutputFormat};
use crate::error::{BuildError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Incremental utility-CSS build driver
#[derive(Parser, Debug)]
#[command(name = "tw-incremental")]
#[command(version)]
#[command(about = "Generate utility CSS for style-sheet entry points, reusing work between loads", long_about = None)]
pub struct Cli {
    /// Style-sheet entry points to load
    #[arg(value_name = "ENTRY", required = true)]
    pub entries: Vec<String>,

    /// File listing module-graph files for the out-of-band scan (one per line)
    /// Use "-" to read from stdin
    #[arg(short = 'm', long = "modules", value_name = "FILE_LIST")]
    pub modules: Option<String>,

    /// Project root used when a style sheet declares no source root
    #[arg(short = 'r', long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Directory to write generated CSS to (use "-" to skip writing)
    #[arg(short = 'o', long = "out", value_name = "DIR", default_value = "-")]
    pub out: String,

    /// File for the build report (use "-" for stdout)
    #[arg(long = "report", value_name = "FILE", default_value = "-")]
    pub report: String,

    /// Number of threads for parallel processing
    #[arg(short = 'j', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Load every entry N more times against the same session
    #[arg(short = 'w', long = "watch-rounds", value_name = "N", default_value = "0")]
    pub watch_rounds: usize,

    /// Log per-phase timings (also enabled by DEBUG)
    #[arg(long = "debug")]
    pub debug: bool,

    /// Output the report in JSON format
    #[arg(long = "json")]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments into a Config
    pub fn into_config(self) -> Result<Config> {
        if self.threads == Some(0) {
            return Err(BuildError::InvalidConfig(
                "--threads must be at least 1".to_string(),
            ));
        }

        let project_root = match self.root {
            Some(root) if !root.is_dir() => {
                return Err(BuildError::InvalidConfig(format!(
                    "project root '{}' is not a directory",
                    root.display()
                )));
            }
            Some(root) => root,
            None => std::env::current_dir()?,
        };

        let output_format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Console
        };

        Ok(Config {
            project_root,
            entries: self.entries,
            module_list: self.modules,
            output: self.out,
            report_filename: self.report,
            output_format,
            num_threads: self.threads.unwrap_or_else(num_cpus::get),
            debug: self.debug || debug_from_env(),
            watch_rounds: self.watch_rounds,
        })
    }
}
