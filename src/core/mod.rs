//! Core logger types and traits

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod forwarder;
pub mod log_event;
pub mod logger;
pub mod metrics;
pub mod severity;

pub use config::{IndexConfig, LoggerConfig, DEFAULT_REQUEST_TIMEOUT};
pub use dispatcher::{
    effective_worker_count, Dispatcher, DispatcherState, Submitter, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_COUNT,
};
pub use error::{LoggerError, Result};
pub use forwarder::Forwarder;
pub use log_event::{LogEvent, LogMessage};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use severity::{passes_threshold, Severity};
