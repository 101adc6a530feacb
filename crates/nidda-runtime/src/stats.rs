//! Message counters kept by the bootstrap.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated as messages are processed.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    dispatched: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// A point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Messages handed to the bootstrap.
    pub received: u64,
    /// Messages whose dispatch completed without error.
    pub dispatched: u64,
    /// Messages dropped before parsing (bot authors).
    pub ignored: u64,
    /// Messages whose context resolution or dispatch failed.
    pub failed: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Messages: {} received ({} dispatched, {} ignored, {} failed)",
            self.received, self.dispatched, self.ignored, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = DispatchStats::new();
        stats.record_received();
        stats.record_received();
        stats.record_dispatched();
        stats.record_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.received, 2);
        assert_eq!(snapshot.dispatched, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.ignored, 0);
        assert_eq!(
            snapshot.to_string(),
            "Messages: 2 received (1 dispatched, 0 ignored, 1 failed)"
        );
    }
}
