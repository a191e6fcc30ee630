//! Log event structure

use super::severity::Severity;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

/// A message handed to the facade before it becomes an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub severity: Severity,
    pub text: String,
}

impl LogMessage {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

/// Immutable record forwarded to the remote index
///
/// Field names are the wire contract of the index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    #[serde(rename = "@timestamp")]
    timestamp: String,
    #[serde(rename = "event.original")]
    original: String,
    message: String,
    #[serde(rename = "service.name")]
    service_name: String,
    #[serde(rename = "log.level")]
    level: String,
    #[serde(skip)]
    severity: Severity,
}

impl LogEvent {
    /// Capture the current UTC time and build an event. Message and service
    /// name are taken as-is, empty values included.
    pub fn new(message: impl Into<String>, severity: Severity, service_name: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            original: String::new(),
            message: message.into(),
            service_name: service_name.into(),
            level: severity.label().to_string(),
            severity,
        }
    }

    pub fn from_message(message: LogMessage, service_name: impl Into<String>) -> Self {
        Self::new(message.text, message.severity, service_name)
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn level_label(&self) -> &str {
        &self.level
    }

    /// Serialize to the index document body
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.timestamp, self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_document_field_names() {
        let event = LogEvent::new("disk almost full", Severity::Warn, "cart");
        let value: serde_json::Value =
            serde_json::from_slice(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["message"], "disk almost full");
        assert_eq!(value["service.name"], "cart");
        assert_eq!(value["log.level"], "warning");
        assert_eq!(value["event.original"], "");
        assert!(value["@timestamp"].is_string());
        assert_eq!(value.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let event = LogEvent::new("x", Severity::Info, "svc");
        assert!(event.timestamp().ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(event.timestamp()).is_ok());
    }

    #[test]
    fn test_empty_fields_pass_through() {
        let event = LogEvent::new("", Severity::Debug, "");
        assert_eq!(event.message(), "");
        assert_eq!(event.service_name(), "");
    }

    #[test]
    fn test_display_format() {
        let event = LogEvent::new("hello", Severity::Info, "svc");
        assert_eq!(event.to_string(), format!("{} [info] hello", event.timestamp()));
    }
}
