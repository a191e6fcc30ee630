//! Logging facade
//!
//! Every call follows one fixed order: build the event, report it to the
//! error tracker if it is Error or Fatal (regardless of threshold), then gate
//! on the threshold. Events that pass are written to the console and handed
//! to the dispatcher when a remote index is configured. With
//! `console_below_threshold` the console also receives the events the gate
//! rejects.
//!
//! Reconfiguration (`set_severity`, `configure_remote`, `attach_forwarder`,
//! `shutdown`) is expected to come from a single control thread. Concurrent
//! reconfiguration is not guarded against.

use super::{
    config::{IndexConfig, LoggerConfig},
    dispatcher::{Dispatcher, DispatcherState, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT},
    error::Result,
    forwarder::Forwarder,
    log_event::{LogEvent, LogMessage},
    metrics::LoggerMetrics,
    severity::Severity,
};
use crate::appenders::{
    error_tags, ConsoleSink, ErrorTracker, IndexClient, NoopTracker, SentryTracker,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub struct Logger {
    threshold: RwLock<Severity>,
    service: RwLock<String>,
    /// Also receives the worker pool's failure reports
    console: Arc<ConsoleSink>,
    /// Write events below the threshold to the console as well
    console_all: bool,
    tracker: Arc<dyn ErrorTracker>,
    dispatcher: RwLock<Option<Dispatcher>>,
    /// Worker count and configuration of the running remote client
    active_remote: Mutex<Option<(usize, IndexConfig)>>,
    channel_capacity: usize,
    shutdown_timeout: Duration,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Logger with threshold Info, stdout console and no remote sinks
    #[must_use]
    pub fn new() -> Self {
        LoggerBuilder::new().build()
    }

    /// Create a logger from a loaded configuration and start its remote
    /// client
    ///
    /// A configured (or `SENTRY_DSN`) DSN installs a [`SentryTracker`].
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let mut builder = Logger::builder()
            .threshold(config.severity()?)
            .channel_capacity(config.channel_capacity());
        if let Some(dsn) = config.sentry_dsn() {
            builder = builder.error_tracker(Arc::new(SentryTracker::from_dsn(&dsn)?));
        }

        let logger = builder.build();
        logger.configure_remote(config.processes, config.index_config())?;
        Ok(logger)
    }

    pub fn severity(&self) -> Severity {
        *self.threshold.read()
    }

    /// Change the threshold. The change itself is logged at Info under the
    /// previous threshold.
    pub fn set_severity(&self, severity: Severity) {
        self.log_as(Severity::Info, format!("Log level set to: {}", severity.label()));
        *self.threshold.write() = severity;
    }

    pub fn service_name(&self) -> String {
        self.service.read().clone()
    }

    /// (Re)configure the remote index client
    ///
    /// Calling again with the same worker count and configuration is a
    /// no-op. Any other call first shuts down the running worker pool, so
    /// two pools never write at the same time.
    ///
    /// An incomplete configuration only produces a warning: the logger keeps
    /// running without a remote sink and `Ok(())` is returned. A complete
    /// configuration whose client cannot be built returns the error and
    /// leaves no remote client configured.
    pub fn configure_remote(&self, worker_count: usize, config: IndexConfig) -> Result<()> {
        if let Some((workers, active)) = self.active_remote.lock().as_ref() {
            if *workers == worker_count && *active == config {
                return Ok(());
            }
        }

        self.teardown();

        if !config.is_complete() {
            self.warn(format!(
                "missing parameters ({}) for the remote index client, skipping logging to it.",
                config.missing_fields().join(", ")
            ));
            self.warn(format!("{:?}", config));
            return Ok(());
        }

        let client = IndexClient::configure(&config)?;
        *self.service.write() = config.service.clone();
        self.start(worker_count, Arc::new(client))?;
        *self.active_remote.lock() = Some((worker_count, config));

        self.info("initialized remote index client without errors");
        Ok(())
    }

    /// Drain events into a custom forwarder instead of the index client
    ///
    /// Shuts down any running pool first.
    pub fn attach_forwarder(&self, worker_count: usize, forwarder: Arc<dyn Forwarder>) -> Result<()> {
        self.teardown();
        self.start(worker_count, forwarder)
    }

    fn start(&self, worker_count: usize, forwarder: Arc<dyn Forwarder>) -> Result<()> {
        let dispatcher = Dispatcher::start(
            worker_count,
            self.channel_capacity,
            forwarder,
            Arc::clone(&self.metrics),
            Arc::clone(&self.console),
        )?;
        *self.dispatcher.write() = Some(dispatcher);
        Ok(())
    }

    /// Take the dispatcher out and shut it down outside the lock
    fn teardown(&self) -> bool {
        *self.active_remote.lock() = None;
        let dispatcher = self.dispatcher.write().take();
        match dispatcher {
            Some(mut dispatcher) => dispatcher.shutdown(self.shutdown_timeout),
            None => true,
        }
    }

    /// Stop the worker pool. Later events are only written to the console.
    ///
    /// # Returns
    ///
    /// `true` if every worker exited within the shutdown timeout
    pub fn shutdown(&self) -> bool {
        self.teardown()
    }

    pub fn error_tracker_name(&self) -> &str {
        self.tracker.name()
    }

    pub fn is_remote_configured(&self) -> bool {
        self.dispatcher.read().is_some()
    }

    pub fn dispatcher_state(&self) -> DispatcherState {
        self.dispatcher
            .read()
            .as_ref()
            .map(Dispatcher::state)
            .unwrap_or(DispatcherState::Uninitialized)
    }

    /// Forwarder threads of the current pool that are still running
    pub fn live_workers(&self) -> usize {
        self.dispatcher
            .read()
            .as_ref()
            .map(Dispatcher::live_workers)
            .unwrap_or(0)
    }

    /// Get the pipeline metrics
    ///
    /// # Example
    ///
    /// ```
    /// use index_logger::Logger;
    ///
    /// let logger = Logger::new();
    /// logger.info("no remote client configured");
    /// assert_eq!(logger.metrics().submitted_count(), 0);
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn log_as(&self, severity: Severity, message: impl Into<String>) {
        self.dispatch(LogMessage::new(severity, message));
    }

    pub fn log_fmt(&self, severity: Severity, args: fmt::Arguments<'_>) {
        self.log_as(severity, fmt::format(args));
    }

    /// Log several messages in order. `None` entries are skipped.
    pub fn log<I, M>(&self, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<Option<LogMessage>>,
    {
        for message in messages {
            let message: Option<LogMessage> = message.into();
            if let Some(message) = message {
                self.dispatch(message);
            }
        }
    }

    fn dispatch(&self, message: LogMessage) {
        let event = LogEvent::from_message(message, self.service_name());
        let severity = event.severity();

        if severity.is_error_or_worse() {
            self.tracker.report(&event, &error_tags(severity));
            self.metrics.record_error_report();
        }

        let passes = severity.passes(self.severity());
        if passes || self.console_all {
            self.console.emit(&event);
        }
        if !passes {
            return;
        }

        // Clone the producer handle so a blocked submit holds no lock
        let submitter = self.dispatcher.read().as_ref().map(Dispatcher::submitter);
        if let Some(submitter) = submitter {
            submitter.submit(event);
        }
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_as(Severity::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log_as(Severity::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log_as(Severity::Warn, message);
    }

    #[inline]
    pub fn err(&self, message: impl Into<String>) {
        self.log_as(Severity::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log_as(Severity::Fatal, message);
    }

    pub fn flush(&self) -> Result<()> {
        self.console.flush()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use index_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .threshold(Severity::Debug)
    ///     .channel_capacity(64)
    ///     .build();
    /// assert_eq!(logger.severity(), Severity::Debug);
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.teardown();

        let failed = self.metrics.failed_count();
        if failed > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} failed index sends (failure rate: {:.2}%)",
                failed,
                self.metrics.failure_rate()
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use index_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .threshold(Severity::Warn)
///     .console(ConsoleSink::new().with_colors(true))
///     .error_tracker(Arc::new(NoopTracker))
///     .build();
/// ```
pub struct LoggerBuilder {
    threshold: Severity,
    service: String,
    console: Option<ConsoleSink>,
    console_all: bool,
    tracker: Option<Arc<dyn ErrorTracker>>,
    channel_capacity: usize,
    shutdown_timeout: Duration,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            threshold: Severity::Info,
            service: String::new(),
            console: None,
            console_all: false,
            tracker: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn threshold(mut self, severity: Severity) -> Self {
        self.threshold = severity;
        self
    }

    /// Service name stamped on events before a remote client sets one
    #[must_use = "builder methods return a new value"]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn console(mut self, console: ConsoleSink) -> Self {
        self.console = Some(console);
        self
    }

    /// Render events below the threshold on the console too. The threshold
    /// then only gates remote forwarding.
    #[must_use = "builder methods return a new value"]
    pub fn console_below_threshold(mut self, enable: bool) -> Self {
        self.console_all = enable;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_tracker(mut self, tracker: Arc<dyn ErrorTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Channel slots between producers and the worker pool
    ///
    /// Zero (the default) hands each event directly to a free worker.
    #[must_use = "builder methods return a new value"]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            threshold: RwLock::new(self.threshold),
            service: RwLock::new(self.service),
            console: Arc::new(self.console.unwrap_or_default()),
            console_all: self.console_all,
            tracker: self
                .tracker
                .unwrap_or_else(|| Arc::new(NoopTracker) as Arc<dyn ErrorTracker>),
            dispatcher: RwLock::new(None),
            active_remote: Mutex::new(None),
            channel_capacity: self.channel_capacity,
            shutdown_timeout: self.shutdown_timeout,
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn quiet_logger(threshold: Severity) -> Logger {
        Logger::builder()
            .threshold(threshold)
            .console(ConsoleSink::with_writer(io::sink()))
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let logger = LoggerBuilder::default().build();
        assert_eq!(logger.severity(), Severity::Info);
        assert_eq!(logger.dispatcher_state(), DispatcherState::Uninitialized);
        assert!(!logger.is_remote_configured());
    }

    #[test]
    fn test_set_severity() {
        let logger = quiet_logger(Severity::Info);
        logger.set_severity(Severity::Error);
        assert_eq!(logger.severity(), Severity::Error);
    }

    #[test]
    fn test_incomplete_remote_config_is_not_an_error() {
        let logger = quiet_logger(Severity::Info);
        let result = logger.configure_remote(4, IndexConfig::new("cart", "", "acme", "pw"));
        assert!(result.is_ok());
        assert!(!logger.is_remote_configured());
    }

    #[test]
    fn test_bad_address_leaves_remote_unset() {
        let logger = quiet_logger(Severity::Info);
        let result = logger.configure_remote(2, IndexConfig::new("cart", "::nope", "acme", "pw"));
        assert!(result.is_err());
        assert!(!logger.is_remote_configured());
        assert_eq!(logger.dispatcher_state(), DispatcherState::Uninitialized);
    }

    #[test]
    fn test_service_name_from_remote_config() {
        let logger = quiet_logger(Severity::Info);
        logger
            .configure_remote(1, IndexConfig::new("cart", "http://127.0.0.1:9", "acme", "pw"))
            .unwrap();
        assert_eq!(logger.service_name(), "cart");
        assert_eq!(logger.dispatcher_state(), DispatcherState::Running);
        assert!(logger.shutdown());
        assert_eq!(logger.dispatcher_state(), DispatcherState::Uninitialized);
    }

    #[test]
    fn test_from_config_installs_error_tracker() {
        let config = LoggerConfig::from_json_str(
            r#"{"log-level": 1, "sentry-dsn": "http://key@127.0.0.1:9/1"}"#,
        )
        .unwrap();

        let logger = Logger::from_config(&config).unwrap();
        assert_eq!(logger.error_tracker_name(), "sentry");
        assert_eq!(logger.severity(), Severity::Error);
    }

    #[test]
    fn test_from_config_rejects_bad_dsn() {
        let config = LoggerConfig::from_json_str(r#"{"sentry-dsn": "http://127.0.0.1:9/1"}"#).unwrap();
        assert!(Logger::from_config(&config).is_err());
    }

    #[test]
    fn test_log_skips_absent_messages() {
        let logger = quiet_logger(Severity::Debug);
        logger.log(vec![
            Some(LogMessage::new(Severity::Info, "one")),
            None,
            Some(LogMessage::new(Severity::Error, "two")),
        ]);
        assert_eq!(logger.metrics().error_report_count(), 1);
    }
}
