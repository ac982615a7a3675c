//! One build session driven through the plugin hooks

use crate::compiler::BasicCompiler;
use crate::config::Config;
use crate::core::ids::{id_to_path, to_slash};
use crate::error::{BuildError, Result};
use crate::export::{BuildReport, EntryReport, Outcome};
use crate::plugin::{LoadResult, Plugin, ScanPhase};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::thread;

/// Load file list from path (or stdin if "-")
pub fn load_file_list(path: &str) -> Result<Vec<String>> {
    let lines = if path == "-" {
        let stdin = std::io::stdin();
        stdin.lock().lines().collect::<std::io::Result<Vec<_>>>()?
    } else {
        let file = File::open(path).map_err(|e| BuildError::FileNotFound {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        BufReader::new(file)
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?
    };

    // Skip blank lines and comments
    Ok(lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect())
}

/// Make a module id absolute, keeping its query string
fn absolute_id(raw: &str) -> String {
    match raw.split_once('?') {
        Some((path, query)) => format!("{}?{}", to_slash(&id_to_path(path)), query),
        None => to_slash(&id_to_path(raw)),
    }
}

/// Run a build session: scan the module list out of band, then load every
/// entry, `config.watch_rounds + 1` times against the same plugin.
///
/// A failing entry is recorded as an `Outcome::Error` and the session keeps
/// going. Only session-level problems are returned as errors.
pub fn run(config: &Config, progress: impl Fn(&str)) -> Result<BuildReport> {
    let modules: Vec<String> = match &config.module_list {
        Some(list) => load_file_list(list)?
            .iter()
            .map(|m| absolute_id(m))
            .collect(),
        None => Vec::new(),
    };
    let entries: Vec<String> = config.entries.iter().map(|e| absolute_id(e)).collect();

    if entries.is_empty() {
        return Err(BuildError::InvalidConfig(
            "no style-sheet entry points given".to_string(),
        ));
    }

    if config.writes_css() {
        fs::create_dir_all(&config.output)?;
    }

    let plugin = Plugin::new(
        &config.project_root,
        Arc::new(BasicCompiler::new()),
        config.debug,
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build()
        .map_err(|e| BuildError::Other(format!("Failed to create thread pool: {}", e)))?;
    let mut report = BuildReport::default();

    for round in 0..=config.watch_rounds {
        progress(&format!(
            "Round {}: scanning {} modules, loading {} entries...",
            round,
            modules.len(),
            entries.len()
        ));

        let phase = ScanPhase::new();
        let (scanned, loaded) = thread::scope(|s| {
            let scan = s.spawn(|| {
                let scanned = scan_modules(&plugin, &modules);
                phase.finish();
                scanned
            });

            let loads: Vec<_> = entries
                .iter()
                .map(|id| {
                    let (plugin, phase, pool) = (&plugin, &phase, &pool);
                    s.spawn(move || pool.install(|| load_entry(plugin, id, round, phase, config)))
                })
                .collect();

            let loaded: Vec<Result<EntryReport>> = loads
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(BuildError::Other("load thread panicked".into())))
                })
                .collect();
            let scanned = scan.join().unwrap_or(0);
            (scanned, loaded)
        });

        report.modules_scanned += scanned;
        for (id, entry) in entries.iter().zip(loaded) {
            match entry {
                Ok(entry) => report.entries.push(entry),
                Err(e) => {
                    tracing::warn!(id = %id, round, error = %e, "entry failed");
                    report.entries.push(EntryReport::failed(id.as_str(), round, e.to_string()));
                }
            }
        }
    }

    report.roots = plugin.registry().len();
    Ok(report)
}

/// Feed every module through the scan hook
fn scan_modules(plugin: &Plugin, modules: &[String]) -> usize {
    let mut scanned = 0;
    for id in modules {
        match fs::read_to_string(id_to_path(id)) {
            Ok(contents) => {
                if plugin.on_before_parse(id, &contents) {
                    scanned += 1;
                }
            }
            Err(e) => tracing::warn!(id = %id, error = %e, "cannot read module"),
        }
    }
    tracing::debug!(scanned, "out-of-band scan finished");
    scanned
}

fn build_count(plugin: &Plugin, id: &str) -> Option<(usize, usize)> {
    plugin.registry().lookup(id).map(|handle| {
        let root = handle.lock().unwrap_or_else(|e| e.into_inner());
        (root.build_count(), root.candidates().len())
    })
}

fn load_entry(
    plugin: &Plugin,
    id: &str,
    round: usize,
    phase: &ScanPhase,
    config: &Config,
) -> Result<EntryReport> {
    let builds_before = build_count(plugin, id).map_or(0, |(builds, _)| builds);

    let contents = match plugin.on_load(id, || phase.wait())? {
        LoadResult::Pass => {
            return Ok(EntryReport {
                path: id.to_string(),
                round,
                outcome: Outcome::Skipped,
                bytes: 0,
                candidates: 0,
                rebuilt: false,
                output: None,
                error: None,
            })
        }
        LoadResult::Css { contents, .. } => contents,
    };

    let (builds, candidates) = build_count(plugin, id).unwrap_or((builds_before, 0));

    let output = if config.writes_css() {
        let name = id_to_path(id)
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| BuildError::Other(format!("entry '{}' has no file name", id)))?;
        let target = Path::new(&config.output).join(name);
        fs::write(&target, &contents)?;
        Some(target.display().to_string())
    } else {
        None
    };

    Ok(EntryReport {
        path: id.to_string(),
        round,
        outcome: Outcome::Css,
        bytes: contents.len(),
        candidates,
        rebuilt: builds > builds_before,
        output,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn config(temp: &TempDir, entries: &[&str]) -> Config {
        Config {
            project_root: temp.path().to_path_buf(),
            entries: entries
                .iter()
                .map(|e| temp.path().join(e).to_string_lossy().into_owned())
                .collect(),
            module_list: None,
            output: "-".to_string(),
            num_threads: 2,
            debug: false,
            watch_rounds: 0,
            ..Config::default()
        }
    }

    #[test]
    fn test_load_file_list_skips_blank_and_comments() {
        let mut list = NamedTempFile::new().unwrap();
        writeln!(list, "/project/a.ts\n\n# generated\n  /project/b.tsx  ").unwrap();

        let files = load_file_list(list.path().to_str().unwrap()).unwrap();
        assert_eq!(files, vec!["/project/a.ts", "/project/b.tsx"]);
    }

    #[test]
    fn test_load_file_list_missing() {
        let result = load_file_list("/nonexistent/modules.txt");
        assert!(matches!(result, Err(BuildError::FileNotFound { .. })));
    }

    #[test]
    fn test_absolute_id_keeps_query() {
        assert_eq!(
            absolute_id("/project/app.css?direct"),
            "/project/app.css?direct"
        );
        assert_eq!(absolute_id("/project/./src/../app.css"), "/project/app.css");
    }

    #[test]
    fn test_no_entries_is_config_error() {
        let temp = TempDir::new().unwrap();
        let result = run(&config(&temp, &[]), |_| {});
        assert!(matches!(result, Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn test_rounds_reuse_warm_root() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("app.css"),
            "@import 'tailwindcss';\n@source './**/*.html';",
        )
        .unwrap();
        fs::write(temp.path().join("index.html"), r#"<p class="underline">"#).unwrap();

        let mut config = config(&temp, &["app.css"]);
        config.watch_rounds = 2;
        let report = run(&config, |_| {}).unwrap();

        assert_eq!(report.entries.len(), 3);
        assert!(report.entries[0].rebuilt);
        assert!(!report.entries[1].rebuilt);
        assert!(!report.entries[2].rebuilt);
        assert_eq!(report.roots, 1);
    }

    #[test]
    fn test_failed_entry_does_not_abort_session() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("good.css"), "@import 'tailwindcss' source(none);").unwrap();
        fs::write(
            temp.path().join("bad.css"),
            "@import 'tailwindcss' source('./missing');",
        )
        .unwrap();

        let mut config = config(&temp, &["good.css", "bad.css"]);
        config.watch_rounds = 1;
        let report = run(&config, |_| {}).unwrap();

        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.generated(), 2);
        assert_eq!(report.failed(), 2);
        for round in 0..2 {
            let good = &report.entries[round * 2];
            let bad = &report.entries[round * 2 + 1];
            assert_eq!(good.round, round);
            assert_eq!(good.outcome, Outcome::Css);
            assert!(good.path.ends_with("good.css"));
            assert_eq!(bad.outcome, Outcome::Error);
            assert!(bad.path.ends_with("bad.css"));
            assert!(bad.error.as_deref().unwrap().contains("must be a directory"));
        }
    }

    #[test]
    fn test_writes_css_to_output_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.css"), "@import 'tailwindcss' source(none);").unwrap();

        let mut config = config(&temp, &["app.css"]);
        let out = temp.path().join("dist");
        config.output = out.to_string_lossy().into_owned();
        let report = run(&config, |_| {}).unwrap();

        let written = out.join("app.css");
        assert!(written.is_file());
        assert_eq!(
            report.entries[0].output.as_deref(),
            Some(written.display().to_string().as_str())
        );
    }
}
