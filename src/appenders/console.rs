//! Console sink implementation

use crate::core::{LogEvent, Result};
#[cfg(feature = "console")]
use colored::Colorize;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};

/// Synchronous, always-on local output
///
/// Writes one `<timestamp> [<level>] <message>` line per event. Output goes
/// to stdout unless another writer is supplied. The worker pool reports its
/// own failures here as `[LOGGER ...]` lines.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Write rendered lines to `writer` instead of stdout
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            use_colors: false,
        }
    }

    /// Colorize the level label
    ///
    /// # Example
    ///
    /// ```
    /// use index_logger::ConsoleSink;
    ///
    /// let sink = ConsoleSink::new().with_colors(true);
    /// ```
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Render an event as a single console line
    pub fn render(&self, event: &LogEvent) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            let level = event
                .level_label()
                .color(event.severity().color_code())
                .to_string();
            return format!("{} [{}] {}", event.timestamp(), level, event.message());
        }

        event.to_string()
    }

    pub fn write(&self, event: &LogEvent) -> Result<()> {
        let line = self.render(event);
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    /// Write an event, reporting a failed write on stderr instead of
    /// returning it
    pub fn emit(&self, event: &LogEvent) {
        if let Err(e) = self.write(event) {
            eprintln!("[LOGGER ERROR] Console write failed: {}", e);
        }
    }

    /// Write a pipeline diagnostic line, falling back to stderr
    pub fn diagnostic(&self, line: impl fmt::Display) {
        let mut writer = self.writer.lock();
        if writeln!(writer, "{}", line).is_err() {
            eprintln!("{}", line);
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}
