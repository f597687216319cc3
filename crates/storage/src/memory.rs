//! In-memory store implementation for the Greeks cache

use async_trait::async_trait;
use common::{Greeks, Snapshot};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::StoreResult;
use crate::traits::GreeksStore;

/// In-memory Greeks cache
///
/// Every operation is a single short critical section with no await inside,
/// so readers never observe a half-written entry.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Greeks>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached contracts
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl GreeksStore for InMemoryStore {
    async fn put(&self, id: &str, greeks: &Greeks) -> StoreResult<()> {
        self.entries.write().insert(id.to_string(), *greeks);
        Ok(())
    }

    async fn snapshot(&self) -> StoreResult<Snapshot> {
        let entries = self.entries.read();
        Ok(entries.iter().map(|(k, v)| (k.clone(), *v)).collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeks(delta: f64) -> Greeks {
        Greeks {
            delta,
            gamma: 0.02,
            theta: -0.05,
            vega: 0.12,
            rho: 8.0,
        }
    }

    #[tokio::test]
    async fn test_put_then_snapshot() {
        let store = InMemoryStore::new();
        let written = greeks(0.61);

        store.put("AAPL240920C00175000", &written).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.get("AAPL240920C00175000"), Some(&written));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryStore::new();

        store.put("AAPL240920C00175000", &greeks(0.61)).await.unwrap();
        store.put("AAPL240920C00175000", &greeks(0.72)).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["AAPL240920C00175000"].delta, 0.72);
    }

    #[tokio::test]
    async fn test_snapshot_returns_every_key() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());

        store.put("AAPL240920C00175000", &greeks(0.6)).await.unwrap();
        store.put("AAPL240920P00175000", &greeks(-0.4)).await.unwrap();
        store.put("MSFT240920P00300000", &greeks(-0.3)).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        let keys: Vec<_> = snapshot.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                "AAPL240920C00175000",
                "AAPL240920P00175000",
                "MSFT240920P00300000"
            ]
        );
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_snapshot_is_a_copy() {
        let store = InMemoryStore::new();
        store.put("AAPL240920C00175000", &greeks(0.5)).await.unwrap();

        let before = store.snapshot().await.unwrap();
        store.put("AAPL240920C00175000", &greeks(0.9)).await.unwrap();

        assert_eq!(before["AAPL240920C00175000"].delta, 0.5);
    }
}
