//! Configuration types
//!
//! `IndexConfig` describes the remote index connection. `LoggerConfig` is the
//! flat, file-friendly shape an application loads at startup and turns into a
//! threshold plus an `IndexConfig`.

use super::{
    dispatcher::DEFAULT_CHANNEL_CAPACITY,
    error::{LoggerError, Result},
    severity::Severity,
};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default timeout for a single index request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub service: String,
    pub addresses: Vec<String>,
    pub username: String,
    pub password: String,
    pub request_timeout: Duration,
}

impl IndexConfig {
    pub fn new(
        service: impl Into<String>,
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let address = address.into();
        let addresses = if address.is_empty() {
            Vec::new()
        } else {
            vec![address]
        };

        Self {
            service: service.into(),
            addresses,
            username: username.into(),
            password: password.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses
            .into_iter()
            .map(Into::into)
            .filter(|address: &String| !address.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Every field the remote client needs is present
    pub fn is_complete(&self) -> bool {
        !self.service.is_empty()
            && !self.addresses.is_empty()
            && !self.username.is_empty()
            && !self.password.is_empty()
    }

    /// Names of the required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.service.is_empty() {
            missing.push("service");
        }
        if self.addresses.is_empty() {
            missing.push("address");
        }
        if self.username.is_empty() {
            missing.push("username");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        missing
    }

    /// Target index, derived from the credential identifier
    pub fn index_name(&self) -> String {
        format!("logs-{}", self.username)
    }
}

impl fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("IndexConfig")
            .field("service", &self.service)
            .field("addresses", &self.addresses)
            .field("username", &self.username)
            .field("password", &password)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Environment variable consulted when no DSN is configured
pub const SENTRY_DSN_ENV: &str = "SENTRY_DSN";

/// Startup configuration as loaded from a JSON file
///
/// Keys follow the command-line flag names applications already use:
///
/// ```json
/// {
///   "elk-cloud-addr": "https://search.example.com:9243",
///   "elk-service": "cart",
///   "elk-user": "acme",
///   "elk-pass": "secret",
///   "log-level": 2,
///   "processes": 8,
///   "sentry-dsn": "https://public@sentry.example.com/42"
/// }
/// ```
///
/// Without `sentry-dsn` the `SENTRY_DSN` environment variable is used.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggerConfig {
    #[serde(rename = "elk-service")]
    pub service: String,
    #[serde(rename = "elk-cloud-addr")]
    pub address: String,
    #[serde(rename = "elk-user")]
    pub username: String,
    #[serde(rename = "elk-pass")]
    pub password: String,
    #[serde(rename = "log-level")]
    pub log_level: Option<u8>,
    pub processes: usize,
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: Option<usize>,
    #[serde(rename = "sentry-dsn")]
    pub sentry_dsn: Option<String>,
}

impl LoggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Configured threshold, `Info` when absent
    pub fn severity(&self) -> Result<Severity> {
        match self.log_level {
            None => Ok(Severity::default()),
            Some(value) => {
                Severity::try_from(value).map_err(|msg| LoggerError::config("log-level", msg))
            }
        }
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Error-tracker DSN from the file, else from `SENTRY_DSN`
    pub fn sentry_dsn(&self) -> Option<String> {
        self.sentry_dsn_or(std::env::var(SENTRY_DSN_ENV).ok())
    }

    fn sentry_dsn_or(&self, fallback: Option<String>) -> Option<String> {
        self.sentry_dsn
            .clone()
            .or(fallback)
            .filter(|dsn| !dsn.trim().is_empty())
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new(
            self.service.clone(),
            self.address.clone(),
            self.username.clone(),
            self.password.clone(),
        )
    }
}
