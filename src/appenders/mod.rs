//! Output destinations

pub mod console;
pub mod error_tracker;
pub mod index;

pub use console::ConsoleSink;
pub use error_tracker::{error_tags, ErrorTracker, NoopTracker, SentryTracker, Tags};
pub use index::IndexClient;

// Re-export the trait for implementors of custom destinations
pub use crate::core::Forwarder;
