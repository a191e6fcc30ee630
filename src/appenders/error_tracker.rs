//! Error-tracking sink
//!
//! Error and Fatal events are reported to an external collector on every
//! log call, independent of the display threshold. Reporting is best effort:
//! a tracker never returns an error to the logging call.

use crate::core::{LogEvent, LoggerError, Result, Severity};
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Tags attached to every report
pub type Tags = BTreeMap<String, String>;

/// Timeout for a single report request
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Reports waiting for the background reporter before new ones are dropped
pub const DEFAULT_REPORT_QUEUE: usize = 64;

const REPORTER_JOIN_TIMEOUT: Duration = Duration::from_millis(200);

/// `{"level": <label>}` for `severity`
pub fn error_tags(severity: Severity) -> Tags {
    let mut tags = Tags::new();
    tags.insert("level".to_string(), severity.label().to_string());
    tags
}

pub trait ErrorTracker: Send + Sync {
    /// Report an event; failures must be swallowed
    fn report(&self, event: &LogEvent, tags: &Tags);
    fn name(&self) -> &str;
}

/// Tracker that discards every report
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

impl ErrorTracker for NoopTracker {
    fn report(&self, _event: &LogEvent, _tags: &Tags) {}

    fn name(&self) -> &str {
        "noop"
    }
}

/// Reports events to a Sentry-compatible store endpoint
///
/// Reports are queued to a background `error-tracker` thread which owns the
/// HTTP client, so a slow or unreachable collector never stalls the caller.
/// When the queue is full the report is dropped and counted.
///
/// # Example
///
/// ```
/// use index_logger::SentryTracker;
///
/// let tracker = SentryTracker::from_dsn("https://public@sentry.example.com/42").unwrap();
/// assert_eq!(tracker.store_url().as_str(), "https://sentry.example.com/api/42/store/");
/// ```
pub struct SentryTracker {
    store_url: Url,
    public_key: String,
    reports: Sender<serde_json::Value>,
    stop: Option<Sender<()>>,
    reporter: Option<JoinHandle<()>>,
    dropped: AtomicU64,
}

impl SentryTracker {
    /// Parse a `https://<public_key>@<host>/<project_id>` DSN
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        Self::with_queue_capacity(dsn, DEFAULT_REPORT_QUEUE)
    }

    /// Like [`SentryTracker::from_dsn`] with an explicit report queue size
    pub fn with_queue_capacity(dsn: &str, capacity: usize) -> Result<Self> {
        let url = Url::parse(dsn).map_err(|e| LoggerError::config("SentryTracker", e.to_string()))?;

        let public_key = url.username().to_string();
        if public_key.is_empty() {
            return Err(LoggerError::config("SentryTracker", "DSN has no public key"));
        }

        let project_id = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LoggerError::config("SentryTracker", "DSN has no project id"))?
            .to_string();

        let host = url
            .host_str()
            .ok_or_else(|| LoggerError::config("SentryTracker", "DSN has no host"))?;
        let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();

        let store_url = Url::parse(&format!(
            "{}://{}{}/api/{}/store/",
            url.scheme(),
            host,
            port,
            project_id
        ))
        .map_err(|e| LoggerError::config("SentryTracker", e.to_string()))?;

        let http = Client::builder()
            .timeout(DEFAULT_REPORT_TIMEOUT)
            .build()
            .map_err(|e| LoggerError::connection(store_url.as_str(), e.to_string()))?;

        let collector = Collector {
            http,
            store_url: store_url.clone(),
            auth: format!(
                "Sentry sentry_version=7, sentry_client=index_logger/{}, sentry_key={}",
                env!("CARGO_PKG_VERSION"),
                public_key
            ),
        };

        let (reports, queue) = bounded(capacity.max(1));
        let (stop, stopped) = bounded::<()>(0);
        let reporter = thread::Builder::new()
            .name("error-tracker".to_string())
            .spawn(move || collector.run(queue, stopped))?;

        Ok(Self {
            store_url,
            public_key,
            reports,
            stop: Some(stop),
            reporter: Some(reporter),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn store_url(&self) -> &Url {
        &self.store_url
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Reports discarded because the queue was full
    pub fn dropped_reports(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn payload(event: &LogEvent, tags: &Tags) -> serde_json::Value {
        json!({
            "event_id": format!("{:032x}", rand::random::<u128>()),
            "timestamp": event.timestamp(),
            "level": event.level_label(),
            "logger": event.service_name(),
            "platform": "other",
            "message": event.message(),
            "tags": tags,
        })
    }
}

impl ErrorTracker for SentryTracker {
    fn report(&self, event: &LogEvent, tags: &Tags) {
        if let Err(TrySendError::Full(_)) = self.reports.try_send(Self::payload(event, tags)) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn name(&self) -> &str {
        "sentry"
    }
}

impl Drop for SentryTracker {
    fn drop(&mut self) {
        drop(self.stop.take());

        if let Some(handle) = self.reporter.take() {
            let deadline = Instant::now() + REPORTER_JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            // A reporter still inside a request exits once it returns
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

/// State owned by the background reporter thread
struct Collector {
    http: Client,
    store_url: Url,
    auth: String,
}

impl Collector {
    fn run(self, queue: Receiver<serde_json::Value>, stopped: Receiver<()>) {
        loop {
            select! {
                recv(queue) -> payload => match payload {
                    Ok(payload) => {
                        let _ = self.post(&payload);
                    }
                    Err(_) => break,
                },
                recv(stopped) -> _ => break,
            }
        }
    }

    fn post(&self, payload: &serde_json::Value) -> Result<()> {
        let response = self
            .http
            .post(self.store_url.clone())
            .header("X-Sentry-Auth", &self.auth)
            .json(payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoggerError::backend(status.as_u16(), response.text().unwrap_or_default()));
        }
        Ok(())
    }
}
