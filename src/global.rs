//! Process-wide logger
//!
//! Applications that cannot pass a [`Logger`] to every call site install one
//! here at startup. If nothing is installed, the first use creates a default
//! logger (threshold Info, stdout console, no remote client).
//!
//! The installed logger lives for the rest of the process, so call
//! [`shutdown`] before exiting to stop its worker pool.

use crate::core::{IndexConfig, LogMessage, Logger, Result, Severity};
use std::sync::OnceLock;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Install the process-wide logger
///
/// Only the first call succeeds; later calls hand the rejected logger back.
pub fn init(logger: Logger) -> std::result::Result<(), Logger> {
    GLOBAL.set(logger)
}

/// The installed logger, created with defaults on first use
pub fn logger() -> &'static Logger {
    GLOBAL.get_or_init(Logger::new)
}

pub fn set_severity(severity: Severity) {
    logger().set_severity(severity);
}

pub fn configure_remote(worker_count: usize, config: IndexConfig) -> Result<()> {
    logger().configure_remote(worker_count, config)
}

pub fn shutdown() -> bool {
    logger().shutdown()
}

pub fn log_as(severity: Severity, message: impl Into<String>) {
    logger().log_as(severity, message);
}

pub fn log<I, M>(messages: I)
where
    I: IntoIterator<Item = M>,
    M: Into<Option<LogMessage>>,
{
    logger().log(messages);
}

pub fn debug(message: impl Into<String>) {
    logger().debug(message);
}

pub fn info(message: impl Into<String>) {
    logger().info(message);
}

pub fn warn(message: impl Into<String>) {
    logger().warn(message);
}

pub fn err(message: impl Into<String>) {
    logger().err(message);
}

pub fn fatal(message: impl Into<String>) {
    logger().fatal(message);
}
