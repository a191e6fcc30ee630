//! Basic usage example
//!
//! Loads a JSON configuration, installs the process-wide logger and logs at
//! every severity. Without a config path the logger runs console-only.
//! Error and fatal events go to Sentry when `sentry-dsn` or `SENTRY_DSN` is set.
//!
//! Run with: cargo run --example basic_usage -- [config.json] [--stress-test]

use index_logger::global;
use index_logger::prelude::*;
use std::time::Instant;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().filter(|arg| !arg.starts_with("--"));
    let stress_test = std::env::args().any(|arg| arg == "--stress-test");

    let config = match config_path {
        Some(path) => LoggerConfig::from_json_file(path)?,
        None => LoggerConfig::default(),
    };

    // Must run before any logging call
    let logger = Logger::from_config(&config)?;
    if global::init(logger).is_err() {
        return Err(LoggerError::other("global logger already installed"));
    }

    let now = Instant::now();
    global::info("Hello info!");
    global::warn("Hello warn");
    global::err("Hello error");
    global::log_as(Severity::Fatal, "Hello fatal!");
    global::info("More logging!");

    if stress_test {
        for i in 0..1000 {
            index_logger::info!(global::logger(), "Sending stress test log {}", i);
        }
    }

    global::shutdown();
    println!("Sent all log messages to the index: {:?}", now.elapsed());

    Ok(())
}
