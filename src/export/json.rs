//! JSON exporter

use crate::config::Config;
use crate::error::Result;
use crate::export::{BuildReport, EntryReport, Exporter};
use serde::Serialize;
use std::io::Write;

/// JSON output exporter
pub struct JsonExporter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    entries: &'a [EntryReport],
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    modules_scanned: usize,
    entries_loaded: usize,
    css_generated: usize,
    compiler_builds: usize,
    failed: usize,
    roots: usize,
}

impl Exporter for JsonExporter {
    fn export(&self, report: &BuildReport, _config: &Config, writer: &mut dyn Write) -> Result<()> {
        let output = JsonOutput {
            entries: &report.entries,
            summary: JsonSummary {
                modules_scanned: report.modules_scanned,
                entries_loaded: report.entries.len(),
                css_generated: report.generated(),
                compiler_builds: report.rebuilds(),
                failed: report.failed(),
                roots: report.roots,
            },
        };

        let json = serde_json::to_string_pretty(&output)?;
        writeln!(writer, "{}", json)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sample_report;

    #[test]
    fn test_json_export() {
        let report = sample_report();
        let config = Config::default();
        let mut output = Vec::new();

        JsonExporter.export(&report, &config, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output_str).unwrap();

        assert_eq!(parsed["summary"]["css_generated"], 2);
        assert_eq!(parsed["summary"]["compiler_builds"], 1);
        assert_eq!(parsed["summary"]["failed"], 1);
        assert_eq!(parsed["entries"].as_array().unwrap().len(), 4);
        assert_eq!(parsed["entries"][0]["outcome"], "css");
        assert_eq!(parsed["entries"][2]["outcome"], "skipped");
        assert!(parsed["entries"][0].get("output").is_none());
        assert!(parsed["entries"][0].get("error").is_none());
        assert_eq!(parsed["entries"][3]["outcome"], "error");
        assert!(parsed["entries"][3]["error"]
            .as_str()
            .unwrap()
            .contains("must be a directory"));
    }
}
