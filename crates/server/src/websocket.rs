//! Subscriber WebSocket stream
//!
//! Every accepted connection gets its own push loop: on each tick it reads
//! the whole cache and sends it as one JSON text frame. Clients do not need
//! to send anything; inbound frames other than Close are ignored.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use observability::ServerMetrics;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage::GreeksStore;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcast::{push_ticker, snapshot_payload};
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::traits::Server;

pub type ConnectionId = u64;

/// Open subscriber connections by id, shared with the HTTP health check
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    peers: Arc<RwLock<HashMap<ConnectionId, SocketAddr>>>,
}

impl ConnectionRegistry {
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    fn insert(&self, id: ConnectionId, peer_addr: SocketAddr) {
        self.peers.write().insert(id, peer_addr);
    }

    fn remove(&self, id: ConnectionId) -> Option<SocketAddr> {
        self.peers.write().remove(&id)
    }
}

/// WebSocket listener pushing cache snapshots to every subscriber
#[derive(Clone)]
pub struct WebSocketServer {
    config: ServerConfig,
    store: Arc<dyn GreeksStore>,
    push_interval: Duration,
    running: Arc<AtomicBool>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
    next_conn_id: Arc<AtomicU64>,
    connections: ConnectionRegistry,
    metrics: ServerMetrics,
}

impl WebSocketServer {
    pub fn new(config: ServerConfig, store: Arc<dyn GreeksStore>, push_interval: Duration) -> Self {
        Self {
            config,
            store,
            push_interval,
            running: Arc::new(AtomicBool::new(false)),
            bound_addr: Arc::new(RwLock::new(None)),
            next_conn_id: Arc::new(AtomicU64::new(1)),
            connections: ConnectionRegistry::default(),
            metrics: ServerMetrics::new("websocket"),
        }
    }

    /// Handle onto the live connection set
    pub fn registry(&self) -> ConnectionRegistry {
        self.connections.clone()
    }

    fn next_connection_id(&self) -> ConnectionId {
        self.next_conn_id.fetch_add(1, Ordering::SeqCst)
    }

    fn register_connection(&self, id: ConnectionId, peer_addr: SocketAddr) {
        self.connections.insert(id, peer_addr);
        self.metrics.connection_opened();
    }

    fn unregister_connection(&self, id: ConnectionId) {
        if let Some(peer_addr) = self.connections.remove(id) {
            self.metrics.connection_closed();
            info!(conn_id = id, %peer_addr, "Subscriber connection closed");
        }
    }

    async fn handle_connection(
        &self,
        conn_id: ConnectionId,
        stream: TcpStream,
        peer_addr: SocketAddr,
        conn_token: CancellationToken,
    ) -> Result<()> {
        let ws_stream = accept_async(stream).await.map_err(ServerError::WebSocket)?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        self.register_connection(conn_id, peer_addr);
        info!(conn_id, %peer_addr, "Subscriber connected");

        let mut ticker = push_ticker(self.push_interval);

        loop {
            tokio::select! {
                _ = conn_token.cancelled() => {
                    debug!(conn_id, "Closing subscriber for server shutdown");
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }

                _ = ticker.tick() => {
                    let payload = match snapshot_payload(self.store.as_ref()).await {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(conn_id, error = %e, "Skipping push, snapshot unavailable");
                            continue;
                        }
                    };

                    if let Err(e) = ws_sender.send(Message::Text(payload)).await {
                        debug!(conn_id, error = %e, "Push failed, dropping subscriber");
                        self.metrics.send_failed();
                        break;
                    }
                    self.metrics.message_sent();
                }

                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | None => {
                            debug!(conn_id, "Subscriber disconnected");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!(conn_id, error = %e, "Subscriber protocol error");
                            break;
                        }
                    }
                }
            }
        }

        self.unregister_connection(conn_id);
        Ok(())
    }
}

#[async_trait]
impl Server for WebSocketServer {
    fn name(&self) -> &str {
        "websocket"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.config.socket_addr(self.config.websocket_port, "WebSocket")?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;

        let local_addr = listener.local_addr().map_err(ServerError::Io)?;
        *self.bound_addr.write() = Some(local_addr);

        info!(
            %local_addr,
            push_interval_ms = self.push_interval.as_millis() as u64,
            "WebSocket server listening"
        );

        self.running.store(true, Ordering::SeqCst);

        let mut connection_handles: Vec<tokio::task::JoinHandle<()>> = Vec::new();

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    info!("WebSocket server received shutdown signal");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let conn_id = self.next_connection_id();
                            let server = self.clone();
                            let conn_token = shutdown_token.child_token();

                            let handle = tokio::spawn(async move {
                                let result = server
                                    .handle_connection(conn_id, stream, peer_addr, conn_token)
                                    .await;
                                if let Err(e) = result {
                                    warn!(conn_id, %peer_addr, %e, "WebSocket handshake failed");
                                }
                            });

                            connection_handles.push(handle);
                            connection_handles.retain(|h| !h.is_finished());
                        }
                        Err(e) => {
                            error!(%e, "Failed to accept WebSocket connection");
                        }
                    }
                }
            }
        }

        let connection_count = connection_handles.len();
        if connection_count > 0 {
            info!(connection_count, "Waiting for subscribers to close...");

            let drained = tokio::time::timeout(
                Duration::from_secs(10),
                futures::future::join_all(connection_handles),
            )
            .await;

            if drained.is_err() {
                warn!("Timed out waiting for subscribers to close");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        *self.bound_addr.write() = None;

        info!("WebSocket server shutdown complete");
        Ok(())
    }
}
