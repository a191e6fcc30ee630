//! Error types for the index logger

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The remote client handle could not be built
    #[error("Failed to create index client for '{address}': {message}")]
    Connection { address: String, message: String },

    /// Network failure while talking to a remote endpoint
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Backend responded with {status}: {body}")]
    BackendResponse { status: u16, body: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A forwarder thread could not be started
    #[error("Failed to spawn forwarder #{index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a connection construction error
    pub fn connection(address: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Connection {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a backend response error
    pub fn backend(status: u16, body: impl Into<String>) -> Self {
        LoggerError::BackendResponse {
            status,
            body: body.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
