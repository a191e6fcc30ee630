//! Pipeline metrics
//!
//! Counters for monitoring the forwarding pipeline: how many events were
//! submitted, how many reached the remote index, how many failed and how
//! many were dropped by a shutdown.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for pipeline observability
///
/// # Example
///
/// ```
/// use index_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_submitted();
/// metrics.record_forwarded();
///
/// assert_eq!(metrics.submitted_count(), 1);
/// assert_eq!(metrics.forwarded_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Events handed to the dispatcher channel
    submitted: AtomicU64,

    /// Events the remote index accepted
    forwarded: AtomicU64,

    /// Events lost to serialization, transport or backend failures
    failed: AtomicU64,

    /// Events discarded because the dispatcher was cancelled
    dropped: AtomicU64,

    /// Events reported to the error tracker
    error_reports: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            error_reports: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forwarded_count(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn error_report_count(&self) -> u64 {
        self.error_reports.load(Ordering::Relaxed)
    }

    /// Record a submitted event, returning the previous count
    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_forwarded(&self) -> u64 {
        self.forwarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `n` dropped events at once
    #[inline]
    pub fn record_dropped_many(&self, n: u64) -> u64 {
        self.dropped.fetch_add(n, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_error_report(&self) -> u64 {
        self.error_reports.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of finished sends that failed, as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been sent yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed_count() as f64;
        let total = self.forwarded_count() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.submitted.store(0, Ordering::Relaxed);
        self.forwarded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.error_reports.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted_count()),
            forwarded: AtomicU64::new(self.forwarded_count()),
            failed: AtomicU64::new(self.failed_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            error_reports: AtomicU64::new(self.error_report_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.submitted_count(), 0);
        assert_eq!(metrics.forwarded_count(), 0);
        assert_eq!(metrics.failed_count(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.error_report_count(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_failed(), 0);
        assert_eq!(metrics.record_failed(), 1);
        assert_eq!(metrics.failed_count(), 2);
        assert_eq!(metrics.record_dropped_many(5), 0);
        assert_eq!(metrics.dropped_count(), 5);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_forwarded();
        }
        for _ in 0..10 {
            metrics.record_failed();
        }

        let rate = metrics.failure_rate();
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_submitted();
        metrics.record_forwarded();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.submitted_count(), 0);
        assert_eq!(snapshot.submitted_count(), 1);
        assert_eq!(snapshot.forwarded_count(), 1);
    }
}
