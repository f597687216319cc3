//! Storage error types

use thiserror::Error;

/// Errors that can occur in the Greeks store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing store could not be reached or rejected a command
    #[error("Redis error: {0}")]
    Redis(String),

    /// A cached value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        Self::Redis(e.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
