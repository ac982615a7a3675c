//! Console (human-readable) exporter

use crate::config::Config;
use crate::error::Result;
use crate::export::{BuildReport, Exporter, Outcome};
use std::io::Write;

/// Human-readable console output exporter
pub struct ConsoleExporter;

impl Exporter for ConsoleExporter {
    fn export(&self, report: &BuildReport, config: &Config, writer: &mut dyn Write) -> Result<()> {
        for entry in &report.entries {
            match entry.outcome {
                Outcome::Css => {
                    let state = if entry.rebuilt { "rebuilt" } else { "reused" };
                    writeln!(
                        writer,
                        "[{}] {} ({} bytes, {} candidates, {})",
                        entry.round, entry.path, entry.bytes, entry.candidates, state
                    )?;
                    if let Some(output) = &entry.output {
                        writeln!(writer, "    -> {}", output)?;
                    }
                }
                Outcome::Skipped => {
                    writeln!(writer, "[{}] {} (skipped)", entry.round, entry.path)?;
                }
                Outcome::Error => {
                    writeln!(writer, "[{}] {} (failed)", entry.round, entry.path)?;
                    if let Some(error) = &entry.error {
                        writeln!(writer, "    {}", error)?;
                    }
                }
            }
        }
        writeln!(writer)?;

        writeln!(writer, "Configuration:")?;
        writeln!(writer, "  Project root: {}", config.project_root.display())?;
        writeln!(writer, "  Load rounds: {}", config.watch_rounds + 1)?;
        writeln!(writer)?;

        writeln!(writer, "Summary:")?;
        writeln!(writer, "  Modules scanned: {}", report.modules_scanned)?;
        writeln!(writer, "  Entries loaded: {}", report.entries.len())?;
        writeln!(writer, "  CSS generated: {}", report.generated())?;
        writeln!(writer, "  Compiler builds: {}", report.rebuilds())?;
        writeln!(writer, "  Failed: {}", report.failed())?;
        writeln!(writer, "  Active roots: {}", report.roots)?;

        Ok(())
    }
}
