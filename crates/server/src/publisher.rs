//! Snapshot fan-out to a pub/sub channel
//!
//! A second consumer of the cache alongside the WebSocket stream: on the same
//! cadence it publishes the same JSON payload, so downstream services can
//! subscribe without holding a socket to this process.

use async_trait::async_trait;
use observability::ServerMetrics;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage::GreeksStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broadcast::{push_ticker, snapshot_payload};
use crate::error::{Result, ServerError};
use crate::traits::Server;

/// Destination for published snapshots
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    async fn publish(&self, payload: &str) -> Result<()>;
}

/// Redis `PUBLISH` to a fixed channel
#[derive(Clone)]
pub struct RedisChannelSink {
    redis: redis::aio::ConnectionManager,
    channel: String,
}

impl RedisChannelSink {
    pub async fn connect(url: &str, channel: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| ServerError::ConfigError(e.to_string()))?;
        let redis = client.get_connection_manager().await?;

        Ok(Self {
            redis,
            channel: channel.into(),
        })
    }
}

#[async_trait]
impl SnapshotSink for RedisChannelSink {
    fn describe(&self) -> String {
        format!("redis channel {}", self.channel)
    }

    async fn publish(&self, payload: &str) -> Result<()> {
        let mut redis = self.redis.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(&self.channel)
            .arg(payload)
            .query_async(&mut redis)
            .await?;

        debug!(channel = %self.channel, receivers, "Published snapshot");
        Ok(())
    }
}

/// Periodic snapshot publisher.
///
/// A failed read or publish is logged and retried on the next tick.
#[derive(Clone)]
pub struct SnapshotPublisher {
    store: Arc<dyn GreeksStore>,
    sink: Arc<dyn SnapshotSink>,
    interval: Duration,
    running: Arc<AtomicBool>,
    metrics: ServerMetrics,
}

impl SnapshotPublisher {
    pub fn new(
        store: Arc<dyn GreeksStore>,
        sink: Arc<dyn SnapshotSink>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            sink,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            metrics: ServerMetrics::new("publisher"),
        }
    }

    async fn publish_once(&self) -> Result<()> {
        let payload = snapshot_payload(self.store.as_ref()).await?;
        self.sink.publish(&payload).await
    }
}

#[async_trait]
impl Server for SnapshotPublisher {
    fn name(&self) -> &str {
        "publisher"
    }

    fn address(&self) -> Option<SocketAddr> {
        None
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            sink = %self.sink.describe(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting snapshot publisher"
        );
        self.running.store(true, Ordering::SeqCst);

        let mut ticker = push_ticker(self.interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.publish_once().await {
                        Ok(()) => self.metrics.message_sent(),
                        Err(e) => {
                            warn!(error = %e, "Snapshot publish failed");
                            self.metrics.send_failed();
                        }
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Snapshot publisher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ServerExt;
    use common::Greeks;
    use parking_lot::Mutex;
    use storage::InMemoryStore;

    #[derive(Default)]
    struct RecordingSink {
        payloads: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SnapshotSink for RecordingSink {
        fn describe(&self) -> String {
            "recording".to_string()
        }

        async fn publish(&self, payload: &str) -> Result<()> {
            if self.fail {
                return Err(ServerError::Publish("channel closed".into()));
            }
            self.payloads.lock().push(payload.to_string());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_on_each_tick() {
        let store = Arc::new(InMemoryStore::new());
        store.put("AAPL240920C00175000", &Greeks::zero()).await.unwrap();
        let sink = Arc::new(RecordingSink::default());

        let publisher = SnapshotPublisher::new(store, sink.clone(), Duration::from_millis(500));
        let token = CancellationToken::new();
        let handle = publisher.spawn(token.clone());

        // ticks at 0, 500 and 1000 ms
        tokio::time::sleep(Duration::from_millis(1200)).await;
        token.cancel();
        handle.await.unwrap().unwrap();

        let payloads = sink.payloads.lock();
        assert_eq!(payloads.len(), 3);
        assert!(payloads[0].starts_with(r#"{"AAPL240920C00175000":{"delta":0.0"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_keeps_running() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let publisher = SnapshotPublisher::new(
            Arc::new(InMemoryStore::new()),
            sink,
            Duration::from_millis(500),
        );
        let running = publisher.running.clone();
        let token = CancellationToken::new();
        let handle = publisher.spawn(token.clone());

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(running.load(Ordering::SeqCst));

        token.cancel();
        handle.await.unwrap().unwrap();
        assert!(!running.load(Ordering::SeqCst));
    }
}
