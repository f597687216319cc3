//! Latest-value Greeks cache
//!
//! The poller writes one entry per contract identifier and every subscriber
//! reads full snapshots. Two backends are provided:
//!
//! - [`InMemoryStore`] - process-local, lost on restart
//! - [`RedisStore`] - a Redis hash shared with other processes
//!
//! Both implement [`GreeksStore`]; [`create_store`] picks one from config.

mod error;
mod memory;
mod redis_store;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use redis_store::{RedisStore, DEFAULT_HASH_KEY};
pub use traits::GreeksStore;

use std::sync::Arc;
use tracing::info;

/// Store type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// In-memory store (fast, non-persistent)
    InMemory,
    /// Redis store (shared)
    Redis,
}

impl StoreType {
    /// Parse store type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inmemory" | "in_memory" | "memory" => Some(StoreType::InMemory),
            "redis" => Some(StoreType::Redis),
            _ => None,
        }
    }
}

/// Create a store based on configuration
pub async fn create_store(config: &config::StoreConfig) -> StoreResult<Arc<dyn GreeksStore>> {
    let store_type = StoreType::parse(&config.store_type)
        .ok_or_else(|| StoreError::Config(format!("unknown store type: {}", config.store_type)))?;

    match store_type {
        StoreType::InMemory => {
            info!("Creating in-memory greeks store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreType::Redis => {
            info!("Creating Redis greeks store");
            let store = RedisStore::connect(&config.redis_url, config.hash_key.clone()).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_store_type_parse() {
        assert_eq!(StoreType::parse("memory"), Some(StoreType::InMemory));
        assert_eq!(StoreType::parse("IN_MEMORY"), Some(StoreType::InMemory));
        assert_eq!(StoreType::parse("redis"), Some(StoreType::Redis));
        assert_eq!(StoreType::parse("postgres"), None);
    }

    #[tokio::test]
    async fn test_create_memory_store() {
        let config = config::StoreConfig {
            store_type: "memory".to_string(),
            ..config::StoreConfig::default()
        };

        let store = create_store(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_store_fails() {
        let config = config::StoreConfig {
            store_type: "sqlite".to_string(),
            ..config::StoreConfig::default()
        };

        let err = create_store(&config).await.err().unwrap();
        assert_matches!(err, StoreError::Config(_));
    }
}
