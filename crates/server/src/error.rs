//! Server error types

use std::io;
use storage::StoreError;
use thiserror::Error;

/// Result type alias for server operations
///
/// WebSocket errors are large; these only occur on connection setup and
/// teardown, not per message.
#[allow(clippy::result_large_err)]
pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid server configuration: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Snapshot unavailable: {0}")]
    Snapshot(#[from] StoreError),

    #[error("Snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Publish failed: {0}")]
    Publish(String),
}

impl ServerError {
    /// Create a bind error from an address string and IO error
    pub fn bind(address: impl Into<String>, source: io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }
}

impl From<redis::RedisError> for ServerError {
    fn from(e: redis::RedisError) -> Self {
        Self::Publish(e.to_string())
    }
}
