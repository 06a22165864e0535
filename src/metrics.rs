// Replacement metrics module
//
// Provides lightweight counters for monitoring replacement activity

use crate::models::{ReplacementOutcome, ReplacementStatus};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Replacement activity metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Counters accumulate across every scan an orchestrator runs and are
/// logged once at shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Total number of files replaced
    pub files_replaced: AtomicUsize,

    /// Total number of replacements that failed
    pub files_failed: AtomicUsize,

    /// Total number of candidates skipped (excluded)
    pub files_skipped: AtomicUsize,

    /// Number of scans started (build and save triggers)
    pub scans: AtomicU64,

    /// Total replacement time in milliseconds
    pub total_replace_time_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            files_replaced: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            files_skipped: AtomicUsize::new(0),
            scans: AtomicU64::new(0),
            total_replace_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished replacement outcome
    pub fn record_outcome(&self, outcome: &ReplacementOutcome) {
        match outcome.status {
            ReplacementStatus::Replaced => {
                self.files_replaced.fetch_add(1, Ordering::Relaxed);
                self.record_replace_time(outcome.duration);
            }
            ReplacementStatus::Failed => {
                self.files_failed.fetch_add(1, Ordering::Relaxed);
            }
            ReplacementStatus::Skipped => {
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn record_replace_time(&self, duration: Duration) {
        self.total_replace_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average replacement time per file in milliseconds
    pub fn avg_replace_time_ms(&self) -> f64 {
        let total = self.total_replace_time_ms.load(Ordering::Relaxed);
        let count = self.files_replaced.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!(
            "Scans: {}, files: {} replaced, {} failed, {} skipped",
            self.scans.load(Ordering::Relaxed),
            self.files_replaced.load(Ordering::Relaxed),
            self.files_failed.load(Ordering::Relaxed),
            self.files_skipped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Replacement time: {:.2}s (avg: {:.2}ms per file), uptime {:.2}s",
            self.total_replace_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_replace_time_ms(),
            self.uptime().as_secs_f64()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
