//! Barrier between candidate discovery and CSS generation

use std::sync::{Condvar, Mutex};

/// Signals the end of the out-of-band scan phase.
///
/// The host finishes the phase once every module has gone through the scan
/// hook; load hooks wait on it so that no style sheet is generated from a
/// partial candidate set.
#[derive(Debug, Default)]
pub struct ScanPhase {
    finished: Mutex<bool>,
    cond: Condvar,
}

impl ScanPhase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&self) {
        let mut finished = self.finished.lock().unwrap_or_else(|e| e.into_inner());
        *finished = true;
        self.cond.notify_all();
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until [`finish`](ScanPhase::finish) has been called
    pub fn wait(&self) {
        let mut finished = self.finished.lock().unwrap_or_else(|e| e.into_inner());
        while !*finished {
            finished = self.cond.wait(finished).unwrap_or_else(|e| e.into_inner());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_returns_after_finish() {
        let phase = Arc::new(ScanPhase::new());
        let waiter = {
            let phase = phase.clone();
            thread::spawn(move || {
                phase.wait();
                phase.is_finished()
            })
        };

        phase.finish();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_wait_after_finish_does_not_block() {
        let phase = ScanPhase::new();
        phase.finish();
        phase.wait();
        assert!(phase.is_finished());
    }
}
