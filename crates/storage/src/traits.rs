//! Store trait for the Greeks cache
//!
//! This module defines the trait that all cache backends must satisfy.

use async_trait::async_trait;
use common::{Greeks, Snapshot};

use crate::error::StoreResult;

/// Latest-value cache of computed Greeks
///
/// The poller is the only writer. Subscribers read full snapshots.
/// Implementations keep no history: a `put` replaces whatever was stored
/// under the key, and nothing is ever evicted.
#[async_trait]
pub trait GreeksStore: Send + Sync {
    /// Overwrite the entry for a contract identifier
    async fn put(&self, id: &str, greeks: &Greeks) -> StoreResult<()>;

    /// Copy of every entry currently stored
    ///
    /// Backends shared out-of-process only guarantee per-key atomicity, so a
    /// snapshot may mix results from two poll cycles.
    async fn snapshot(&self) -> StoreResult<Snapshot>;

    /// Backend name for logging
    fn backend(&self) -> &'static str;
}
