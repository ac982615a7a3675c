//! Phase timing for a single style-sheet load

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Records how long each named phase of a load takes.
///
/// Phases are opened with [`Instrumentation::start`] and closed with
/// [`Instrumentation::end`]. When enabled, closing a phase emits a
/// `tracing` debug event; when disabled every call is a no-op.
#[derive(Debug, Default)]
pub struct Instrumentation {
    enabled: bool,
    open: HashMap<&'static str, Instant>,
    finished: Vec<(&'static str, Duration)>,
}

impl Instrumentation {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// A disabled instrumentation that records nothing
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&mut self, label: &'static str) {
        if self.enabled {
            self.open.insert(label, Instant::now());
        }
    }

    pub fn end(&mut self, label: &'static str) {
        if !self.enabled {
            return;
        }
        if let Some(started) = self.open.remove(label) {
            let elapsed = started.elapsed();
            tracing::debug!(
                phase = label,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "phase finished"
            );
            self.finished.push((label, elapsed));
        }
    }

    /// Phases closed so far, in completion order
    pub fn phases(&self) -> &[(&'static str, Duration)] {
        &self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_records_nothing() {
        let mut i = Instrumentation::disabled();
        i.start("Build CSS");
        i.end("Build CSS");
        assert!(i.phases().is_empty());
    }

    #[test]
    fn test_enabled_records_in_completion_order() {
        let mut i = Instrumentation::new(true);
        i.start("Setup compiler");
        i.start("Setup scanner");
        i.end("Setup scanner");
        i.end("Setup compiler");

        let labels: Vec<_> = i.phases().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["Setup scanner", "Setup compiler"]);
    }

    #[test]
    fn test_end_without_start_is_ignored() {
        let mut i = Instrumentation::new(true);
        i.end("Build CSS");
        assert!(i.phases().is_empty());
    }
}
