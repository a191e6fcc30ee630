//! Severity definitions
//!
//! Severities are ordered from most to least urgent. A lower discriminant is
//! more severe, so a threshold accepts every severity that compares less than
//! or equal to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal = 0,
    Error = 1,
    Warn = 2,
    #[default]
    Info = 3,
    Debug = 4,
}

/// Label used for numeric severities outside the known range
pub const UNKNOWN_LABEL: &str = "unknown";

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Fatal,
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
    ];

    /// Lowercase label shared by the index document, the console line and
    /// the error-tracking tags.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warn => "warning",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }

    /// Label for a raw numeric severity, `"unknown"` when out of range
    pub fn label_for(value: u8) -> &'static str {
        Severity::try_from(value)
            .map(|severity| severity.label())
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// Whether an event of this severity passes `threshold`
    #[inline]
    pub fn passes(&self, threshold: Severity) -> bool {
        *self <= threshold
    }

    /// Error and Fatal events are always reported to the error tracker
    #[inline]
    pub fn is_error_or_worse(&self) -> bool {
        self.passes(Severity::Error)
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Severity::Fatal => BrightRed,
            Severity::Error => Red,
            Severity::Warn => Yellow,
            Severity::Info => Green,
            Severity::Debug => Blue,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(Severity::Fatal),
            1 => Ok(Severity::Error),
            2 => Ok(Severity::Warn),
            3 => Ok(Severity::Info),
            4 => Ok(Severity::Debug),
            _ => Err(format!("Invalid severity value: {}", value)),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fatal" => Ok(Severity::Fatal),
            "error" | "err" => Ok(Severity::Error),
            "warn" | "warning" => Ok(Severity::Warn),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            _ => Err(format!("Invalid severity: '{}'", s)),
        }
    }
}

/// Whether an event of severity `event` passes `threshold`
pub fn passes_threshold(event: Severity, threshold: Severity) -> bool {
    event.passes(threshold)
}
