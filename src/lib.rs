//! # Index Logger
//!
//! A severity-gated logging facade that writes every accepted event to the
//! console and forwards it to a remote search index through a fixed pool of
//! worker threads.
//!
//! ## Features
//!
//! - **Fan-out forwarding**: competing workers drain one bounded channel
//! - **Back-pressure**: producers block while every worker is busy
//! - **Error tracking**: Error and Fatal events are reported to a collector
//! - **Graceful reconfiguration**: the old pool is stopped before a new one starts

pub mod appenders;
pub mod core;
pub mod global;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleSink, ErrorTracker, IndexClient, NoopTracker, SentryTracker};
    pub use crate::core::{
        DispatcherState, Forwarder, IndexConfig, LogEvent, LogMessage, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerMetrics, Result, Severity,
    };
}

pub use crate::appenders::{
    error_tags, ConsoleSink, ErrorTracker, IndexClient, NoopTracker, SentryTracker, Tags,
};
pub use crate::core::{
    effective_worker_count, passes_threshold, Dispatcher, DispatcherState, Forwarder, IndexConfig,
    LogEvent, LogMessage, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, Result,
    Severity, Submitter, DEFAULT_CHANNEL_CAPACITY, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_COUNT,
};
