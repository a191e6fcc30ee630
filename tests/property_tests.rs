//! Property-based tests for index_logger using proptest

use index_logger::prelude::*;
use index_logger::{passes_threshold, Tags};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn any_severity() -> impl Strategy<Value = Severity> {
    proptest::sample::select(Severity::ALL.to_vec())
}

struct CountingTracker(AtomicUsize);

impl ErrorTracker for CountingTracker {
    fn report(&self, _event: &LogEvent, _tags: &Tags) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "counting"
    }
}

struct Discard(Mutex<usize>);

impl Forwarder for Discard {
    fn forward(&self, _event: &LogEvent) -> Result<()> {
        *self.0.lock() += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "discard"
    }
}

// ============================================================================
// Severity Tests
// ============================================================================

proptest! {
    /// Filtering follows the numeric rank: lower is more severe
    #[test]
    fn test_threshold_matches_rank(event in any_severity(), threshold in any_severity()) {
        prop_assert_eq!(passes_threshold(event, threshold), (event as u8) <= (threshold as u8));
    }

    /// Labels round-trip through FromStr
    #[test]
    fn test_label_roundtrip(severity in any_severity()) {
        let parsed: Severity = severity.label().parse().unwrap();
        prop_assert_eq!(parsed, severity);
    }

    /// Every out-of-range number maps to the unknown label
    #[test]
    fn test_unknown_numeric_label(value in 5u8..=255) {
        prop_assert_eq!(Severity::label_for(value), "unknown");
    }
}

// ============================================================================
// Facade Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// An event enters the pipeline iff it passes the threshold, and is
    /// reported to the error tracker exactly once iff it is Error or worse
    #[test]
    fn test_forwarding_and_reporting(event in any_severity(), threshold in any_severity()) {
        let tracker = Arc::new(CountingTracker(AtomicUsize::new(0)));
        let logger = Logger::builder()
            .threshold(threshold)
            .console(ConsoleSink::with_writer(io::sink()))
            .error_tracker(tracker.clone())
            .build();
        logger.attach_forwarder(1, Arc::new(Discard(Mutex::new(0)))).unwrap();

        logger.log_as(event, "property");

        let expected_submits = u64::from(event <= threshold);
        prop_assert_eq!(logger.metrics().submitted_count(), expected_submits);

        let expected_reports = usize::from(event <= Severity::Error);
        prop_assert_eq!(tracker.0.load(Ordering::SeqCst), expected_reports);

        logger.shutdown();
    }

    /// Messages are passed through to the event unchanged
    #[test]
    fn test_message_passthrough(message in ".*", service in "[a-z]{0,12}") {
        let event = LogEvent::new(message.clone(), Severity::Info, service.clone());
        prop_assert_eq!(event.message(), message.as_str());
        prop_assert_eq!(event.service_name(), service.as_str());
    }
}
