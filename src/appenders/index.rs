//! Remote index client
//!
//! Sends each event as one JSON document to a search backend's document
//! index API (`POST <address>/<index>/_doc`). A client built from an
//! incomplete configuration is inert and discards everything it is given.

use crate::core::{Forwarder, IndexConfig, LogEvent, LoggerError, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct IndexClient {
    inner: Option<ActiveClient>,
}

struct ActiveClient {
    http: Client,
    endpoints: Vec<Url>,
    next_endpoint: AtomicUsize,
    index: String,
    service: String,
    username: String,
    password: String,
}

impl IndexClient {
    /// Build a client for `config`
    ///
    /// An incomplete configuration is not an error: the returned client is
    /// inert. A complete configuration whose addresses cannot be parsed, or
    /// whose HTTP client cannot be built, is a connection error.
    ///
    /// # Example
    ///
    /// ```
    /// use index_logger::{IndexClient, IndexConfig};
    ///
    /// let client = IndexClient::configure(&IndexConfig::new("cart", "", "acme", "pw")).unwrap();
    /// assert!(!client.is_active());
    /// ```
    pub fn configure(config: &IndexConfig) -> Result<Self> {
        if !config.is_complete() {
            return Ok(Self::inert());
        }

        let endpoints = config
            .addresses
            .iter()
            .map(|address| document_endpoint(address, &config.index_name()))
            .collect::<Result<Vec<_>>>()?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LoggerError::connection(config.addresses.join(","), e.to_string()))?;

        Ok(Self {
            inner: Some(ActiveClient {
                http,
                endpoints,
                next_endpoint: AtomicUsize::new(0),
                index: config.index_name(),
                service: config.service.clone(),
                username: config.username.clone(),
                password: config.password.clone(),
            }),
        })
    }

    /// A client that silently discards every event
    pub fn inert() -> Self {
        Self { inner: None }
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    pub fn index_name(&self) -> Option<&str> {
        self.inner.as_ref().map(|client| client.index.as_str())
    }

    pub fn service_name(&self) -> Option<&str> {
        self.inner.as_ref().map(|client| client.service.as_str())
    }

    /// Index one event
    ///
    /// The response is consumed and released before returning on every path.
    pub fn send(&self, event: &LogEvent) -> Result<()> {
        let Some(client) = &self.inner else {
            return Ok(());
        };

        let body = event.to_json()?;
        let endpoint = client.endpoint();

        let response = client
            .http
            .post(endpoint.clone())
            .basic_auth(&client.username, Some(&client.password))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LoggerError::backend(status.as_u16(), body));
        }

        Ok(())
    }
}

impl ActiveClient {
    /// Rotate through the configured addresses
    fn endpoint(&self) -> &Url {
        let n = self.next_endpoint.fetch_add(1, Ordering::Relaxed);
        &self.endpoints[n % self.endpoints.len()]
    }
}

impl Forwarder for IndexClient {
    fn forward(&self, event: &LogEvent) -> Result<()> {
        self.send(event)
    }

    fn name(&self) -> &str {
        "index"
    }
}

/// `<address>/<index>/_doc`, keeping any path prefix on the address
fn document_endpoint(address: &str, index: &str) -> Result<Url> {
    let mut url = Url::parse(address).map_err(|e| LoggerError::connection(address, e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(LoggerError::connection(address, "address cannot be used as a base URL"));
    }

    url.path_segments_mut()
        .map_err(|_| LoggerError::connection(address, "address cannot be used as a base URL"))?
        .pop_if_empty()
        .push(index)
        .push("_doc");

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;

    fn config(address: &str) -> IndexConfig {
        IndexConfig::new("cart", address, "acme", "secret")
    }

    #[test]
    fn test_incomplete_config_is_inert() {
        for incomplete in [
            IndexConfig::new("", "http://localhost:9200", "acme", "pw"),
            IndexConfig::new("cart", "", "acme", "pw"),
            IndexConfig::new("cart", "http://localhost:9200", "", "pw"),
            IndexConfig::new("cart", "http://localhost:9200", "acme", ""),
        ] {
            let client = IndexClient::configure(&incomplete).unwrap();
            assert!(!client.is_active());
            assert!(client.send(&LogEvent::new("dropped", Severity::Info, "cart")).is_ok());
        }
    }

    #[test]
    fn test_active_client_targets_derived_index() {
        let client = IndexClient::configure(&config("http://localhost:9200")).unwrap();
        assert!(client.is_active());
        assert_eq!(client.index_name(), Some("logs-acme"));
        assert_eq!(client.service_name(), Some("cart"));
    }

    #[test]
    fn test_unparsable_address_is_connection_error() {
        let result = IndexClient::configure(&config("not a url"));
        assert!(matches!(result, Err(LoggerError::Connection { .. })));
    }

    #[test]
    fn test_document_endpoint() {
        let url = document_endpoint("https://search.example.com:9243", "logs-acme").unwrap();
        assert_eq!(url.as_str(), "https://search.example.com:9243/logs-acme/_doc");

        let url = document_endpoint("http://proxy.local/es/", "logs-acme").unwrap();
        assert_eq!(url.as_str(), "http://proxy.local/es/logs-acme/_doc");
    }

    #[test]
    fn test_unreachable_backend_is_transport_error() {
        // Nothing listens on the discard port
        let client = IndexClient::configure(&config("http://127.0.0.1:9")).unwrap();
        let result = client.send(&LogEvent::new("lost", Severity::Warn, "cart"));
        assert!(matches!(result, Err(LoggerError::Transport(_))));
    }

    #[test]
    fn test_endpoints_rotate() {
        let config = config("").with_addresses(["http://a:9200", "http://b:9200"]);
        let client = IndexClient::configure(&config).unwrap();
        let inner = client.inner.as_ref().unwrap();

        assert_eq!(inner.endpoint().host_str(), Some("a"));
        assert_eq!(inner.endpoint().host_str(), Some("b"));
        assert_eq!(inner.endpoint().host_str(), Some("a"));
    }
}
