//! Export system for build reports

mod console;
mod json;

use crate::config::{Config, OutputFormat};
use crate::error::{BuildError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};

pub use console::ConsoleExporter;
pub use json::JsonExporter;

/// What the load hook did with an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// CSS was generated
    Css,
    /// The entry was passed back to the host untouched
    Skipped,
    /// Generation failed for this entry only
    Error,
}

/// One load of one entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub path: String,
    /// Load pass the entry was generated in, starting at 0
    pub round: usize,
    pub outcome: Outcome,
    /// Size of the generated CSS in bytes
    pub bytes: usize,
    /// Candidates the root's own scanner has accumulated
    pub candidates: usize,
    /// Whether the compiler was (re)built for this load
    pub rebuilt: bool,
    /// Where the CSS was written, if anywhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Why the entry failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntryReport {
    /// Report for an entry whose load failed
    pub fn failed(path: impl Into<String>, round: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            round,
            outcome: Outcome::Error,
            bytes: 0,
            candidates: 0,
            rebuilt: false,
            output: None,
            error: Some(message.into()),
        }
    }
}

/// Everything a build session did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub entries: Vec<EntryReport>,
    /// Modules fed through the out-of-band scan hook
    pub modules_scanned: usize,
    /// Roots alive at the end of the session
    pub roots: usize,
}

impl BuildReport {
    pub fn generated(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == Outcome::Css)
            .count()
    }

    pub fn rebuilds(&self) -> usize {
        self.entries.iter().filter(|e| e.rebuilt).count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == Outcome::Error)
            .count()
    }
}

/// Trait for output formatting
pub trait Exporter {
    /// Write the complete output for the given report
    fn export(&self, report: &BuildReport, config: &Config, writer: &mut dyn Write) -> Result<()>;
}

/// Create an appropriate exporter based on configuration
pub fn create_exporter(format: OutputFormat) -> Box<dyn Exporter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleExporter),
        OutputFormat::Json => Box::new(JsonExporter),
    }
}

/// Get a writer for the report (file or stdout)
pub fn get_output_writer(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(BufWriter::new(io::stdout())))
    } else {
        let file = File::create(path).map_err(BuildError::Io)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

#[cfg(test)]
pub(crate) fn sample_report() -> BuildReport {
    BuildReport {
        entries: vec![
            EntryReport {
                path: "/project/src/app.css".to_string(),
                round: 0,
                outcome: Outcome::Css,
                bytes: 120,
                candidates: 3,
                rebuilt: true,
                output: None,
                error: None,
            },
            EntryReport {
                path: "/project/src/app.css".to_string(),
                round: 1,
                outcome: Outcome::Css,
                bytes: 120,
                candidates: 3,
                rebuilt: false,
                output: None,
                error: None,
            },
            EntryReport {
                path: "/project/src/reset.css".to_string(),
                round: 0,
                outcome: Outcome::Skipped,
                bytes: 0,
                candidates: 0,
                rebuilt: false,
                output: None,
                error: None,
            },
            EntryReport::failed(
                "/project/src/admin.css",
                0,
                "The path given to `source(…)` must be a directory but got `source(/project/missing)` instead.",
            ),
        ],
        modules_scanned: 2,
        roots: 1,
    }
}
