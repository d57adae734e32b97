//! Transport error types.

use thiserror::Error;

/// Errors raised while building or using an HTTP client.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Invalid client configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// The request could not be sent or its body could not be read.
    #[error("request to {url} failed: {reason}")]
    RequestFailed {
        /// Target URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The response body was not the expected JSON.
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn request(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::RequestFailed {
            url: url.into(),
            reason: err.to_string(),
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
