//! Network error types.

use thiserror::Error;

/// Errors from block explorer and notification requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// Transport failure: connection, TLS or timeout.
    #[error("http: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The response body could not be understood.
    #[error("decode: {0}")]
    Decode(String),

    /// Invalid configuration value.
    #[error("config: {0}")]
    Config(String),

    /// Every provider in a failover chain failed.
    #[error("{operation} failed on all providers: {}", attempts.join("; "))]
    AllProvidersFailed {
        operation: &'static str,
        /// One `provider: error` entry per attempt, in order.
        attempts: Vec<String>,
    },
}

impl From<reqwest::Error> for NetError {
    fn from(e: reqwest::Error) -> Self {
        NetError::Http(e.to_string())
    }
}
