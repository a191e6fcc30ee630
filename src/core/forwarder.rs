//! Forwarder trait for remote event destinations

use super::{error::Result, log_event::LogEvent};

/// Destination the worker pool drains events into
///
/// Implementations are shared read-only by every worker, so `forward`
/// takes `&self`. A returned error is reported locally and the event is
/// dropped; nothing is retried.
pub trait Forwarder: Send + Sync {
    fn forward(&self, event: &LogEvent) -> Result<()>;
    fn name(&self) -> &str;
}
