//! Scan counters for the timer service.
//!
//! Plain integer counters updated from inside the scanners; no allocation,
//! safe to touch from the tick interrupt.

use crate::time::Ticks;
use serde::{Deserialize, Serialize};

/// Outcome of a single scan pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Tick value the scan evaluated against.
    pub tick: Ticks,
    /// Slots that transitioned to expired.
    pub expired: usize,
    /// Expired slots rearmed by their handler.
    pub restarted: usize,
}

/// Cumulative scan counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanMetrics {
    /// Interrupt scanner invocations (equals ticks delivered).
    pub interrupt_scans: u64,
    /// Poll scanner invocations that performed a scan.
    pub poll_scans: u64,
    /// Poll scanner invocations skipped because the tick had not changed.
    pub polls_skipped: u64,
    /// Total expiry transitions.
    pub expirations: u64,
    /// Total handler-requested restarts.
    pub restarts: u64,
}

impl ScanMetrics {
    /// Create zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interrupt_scans: 0,
            poll_scans: 0,
            polls_skipped: 0,
            expirations: 0,
            restarts: 0,
        }
    }

    /// Account for a completed interrupt scan.
    pub fn record_interrupt_scan(&mut self, summary: &ScanSummary) {
        self.interrupt_scans += 1;
        self.record_outcome(summary);
    }

    /// Account for a completed poll scan.
    pub fn record_poll_scan(&mut self, summary: &ScanSummary) {
        self.poll_scans += 1;
        self.record_outcome(summary);
    }

    /// Account for a debounced poll.
    pub fn record_poll_skipped(&mut self) {
        self.polls_skipped += 1;
    }

    fn record_outcome(&mut self, summary: &ScanSummary) {
        self.expirations += summary.expired as u64;
        self.restarts += summary.restarted as u64;
    }

    /// Fraction of poll calls that found a new tick.
    #[must_use]
    pub fn poll_hit_ratio(&self) -> Option<f64> {
        let total = self.poll_scans + self.polls_skipped;
        if total == 0 {
            None
        } else {
            Some(self.poll_scans as f64 / total as f64)
        }
    }
}
