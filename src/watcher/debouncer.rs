//! Per-path debouncing of change events.
//!
//! Editors and spreadsheet tools often write a file several times while
//! saving. Each write restarts the path's quiet period; the path is handed
//! out once it has been quiet for the whole window.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Collapses bursts of changes to the same path into one.
#[derive(Debug)]
pub struct Debouncer {
    /// path -> time of the latest change
    pending: HashMap<PathBuf, Instant>,
    window: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            window: Duration::from_millis(debounce_ms),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a change now, restarting the path's quiet period.
    pub fn record(&mut self, path: PathBuf) {
        self.record_at(path, Instant::now());
    }

    pub fn record_at(&mut self, path: PathBuf, at: Instant) {
        self.pending.insert(path, at);
    }

    /// Forget a pending change (the file was deleted).
    pub fn remove(&mut self, path: &Path) -> bool {
        self.pending.remove(path).is_some()
    }

    /// Paths quiet for the whole window, in path order. They leave the
    /// pending set.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        self.take_ready_at(Instant::now())
    }

    pub fn take_ready_at(&mut self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut ready = Vec::new();

        self.pending.retain(|path, last_change| {
            let quiet = now.saturating_duration_since(*last_change) >= window;
            if quiet {
                ready.push(path.clone());
            }
            !quiet
        });

        ready.sort();
        ready
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_ready_after_quiet_window() {
        let mut debouncer = Debouncer::new(300);
        let start = Instant::now();
        let path = PathBuf::from("/data/equipment.csv");

        debouncer.record_at(path.clone(), start);
        assert!(debouncer.take_ready_at(start + ms(299)).is_empty());
        assert!(debouncer.has_pending());

        assert_eq!(debouncer.take_ready_at(start + ms(300)), vec![path]);
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_burst_collapses_to_one() {
        let mut debouncer = Debouncer::new(300);
        let start = Instant::now();
        let path = PathBuf::from("/data/equipment.csv");

        debouncer.record_at(path.clone(), start);
        debouncer.record_at(path.clone(), start + ms(200));
        assert_eq!(debouncer.pending_count(), 1);

        // 400ms after the first write but only 200ms after the second
        assert!(debouncer.take_ready_at(start + ms(400)).is_empty());
        assert_eq!(debouncer.take_ready_at(start + ms(500)), vec![path]);
        assert!(debouncer.take_ready_at(start + ms(900)).is_empty());
    }

    #[test]
    fn test_paths_are_independent() {
        let mut debouncer = Debouncer::new(100);
        let start = Instant::now();
        let pumps = PathBuf::from("/data/pumps.csv");
        let valves = PathBuf::from("/data/valves.json");

        debouncer.record_at(pumps.clone(), start);
        debouncer.record_at(valves.clone(), start + ms(60));

        assert_eq!(debouncer.take_ready_at(start + ms(120)), vec![pumps]);
        assert_eq!(debouncer.take_ready_at(start + ms(160)), vec![valves]);
    }

    #[test]
    fn test_remove_cancels_pending_change() {
        let mut debouncer = Debouncer::new(100);
        let path = PathBuf::from("/data/equipment.csv");

        debouncer.record(path.clone());
        assert!(debouncer.remove(&path));
        assert!(!debouncer.remove(&path));
        assert!(!debouncer.has_pending());
    }
}
