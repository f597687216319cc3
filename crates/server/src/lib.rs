//! Subscriber-facing side of the Greeks service
//!
//! Everything here only reads the cache:
//!
//! - [`websocket`] pushes the full snapshot to each subscriber on a fixed cadence
//! - [`api`] serves health and snapshot JSON over HTTP
//! - [`publisher`] republishes the snapshot on a pub/sub channel
//!
//! All of them implement [`Server`] and stop when their `CancellationToken`
//! is cancelled; [`GreeksServer`] runs whichever are configured as one unit.

use std::sync::Arc;
use std::time::Duration;
use storage::GreeksStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod http;
pub mod publisher;
pub mod shutdown;
pub mod traits;
pub mod websocket;

pub use api::ApiState;
pub use broadcast::{push_ticker, snapshot_payload};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use http::HttpServer;
pub use publisher::{RedisChannelSink, SnapshotPublisher, SnapshotSink};
pub use shutdown::ShutdownController;
pub use traits::{Server, ServerExt};
pub use websocket::{ConnectionRegistry, WebSocketServer};

type ServerHandle = tokio::task::JoinHandle<Result<()>>;

/// HTTP API, WebSocket stream and optional channel publisher over one store
pub struct GreeksServer {
    name: String,
    http_server: Option<HttpServer>,
    ws_server: Option<WebSocketServer>,
    publisher: Option<SnapshotPublisher>,
}

impl GreeksServer {
    pub fn new(
        name: impl Into<String>,
        config: ServerConfig,
        store: Arc<dyn GreeksStore>,
        push_interval: Duration,
    ) -> Self {
        let name = name.into();
        let ws_server = config
            .websocket_port
            .map(|_| WebSocketServer::new(config.clone(), store.clone(), push_interval));
        let http_server = config.http_port.map(|_| {
            let mut state = ApiState::new(name.clone(), store.clone());
            if let Some(ws) = &ws_server {
                state = state.with_subscribers(ws.registry());
            }
            HttpServer::with_api(config.clone(), state)
        });

        Self {
            name,
            http_server,
            ws_server,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: SnapshotPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }
}

#[async_trait::async_trait]
impl Server for GreeksServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Option<std::net::SocketAddr> {
        self.ws_server
            .as_ref()
            .and_then(|s| s.address())
            .or_else(|| self.http_server.as_ref().and_then(|s| s.address()))
    }

    fn is_running(&self) -> bool {
        self.http_server.as_ref().is_some_and(|s| s.is_running())
            || self.ws_server.as_ref().is_some_and(|s| s.is_running())
            || self.publisher.as_ref().is_some_and(|p| p.is_running())
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        info!(server = %self.name, "Starting servers...");

        let mut handles: Vec<ServerHandle> = Vec::new();

        if let Some(ref http) = self.http_server {
            handles.push(http.clone().spawn(shutdown_token.child_token()));
        }

        if let Some(ref ws) = self.ws_server {
            handles.push(ws.clone().spawn(shutdown_token.child_token()));
        }

        if let Some(ref publisher) = self.publisher {
            handles.push(publisher.clone().spawn(shutdown_token.child_token()));
        }

        if handles.is_empty() {
            warn!("No servers configured to start");
            return Ok(());
        }

        // A component exiting on its own takes the rest down with it.
        let mut failure = None;
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                info!("Shutdown signal received");
            }
            result = wait_for_first_completion(&mut handles) => {
                match result {
                    Some(Ok(Ok(()))) => warn!("A server exited unexpectedly (but successfully)"),
                    Some(Ok(Err(e))) => {
                        error!(%e, "A server exited with error");
                        failure = Some(e);
                    }
                    Some(Err(e)) => error!(%e, "A server task panicked"),
                    None => {}
                }
                shutdown_token.cancel();
            }
        }

        info!("Waiting for all servers to shut down...");
        let drained =
            tokio::time::timeout(Duration::from_secs(30), futures::future::join_all(handles)).await;
        match drained {
            Ok(results) => {
                let errors: Vec<_> = results
                    .into_iter()
                    .filter_map(|r| match r {
                        Ok(Ok(())) => None,
                        Ok(Err(e)) => Some(e.to_string()),
                        Err(e) => Some(format!("Task panicked: {}", e)),
                    })
                    .collect();

                if !errors.is_empty() {
                    warn!(?errors, "Some servers had errors during shutdown");
                }
            }
            Err(_) => warn!("Timed out waiting for servers to shut down"),
        }

        info!(server = %self.name, "Server shutdown complete");
        failure.map_or(Ok(()), Err)
    }
}

async fn wait_for_first_completion(
    handles: &mut [ServerHandle],
) -> Option<std::result::Result<Result<()>, tokio::task::JoinError>> {
    if handles.is_empty() {
        return None;
    }

    let (result, _index, _remaining) =
        futures::future::select_all(handles.iter_mut()).await;

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use storage::InMemoryStore;

    #[tokio::test]
    async fn test_greeks_server_shutdown() {
        let server = GreeksServer::new(
            "greeksd",
            ServerConfig::new("127.0.0.1", 0, 0),
            Arc::new(InMemoryStore::new()),
            Duration::from_millis(500),
        );

        let token = CancellationToken::new();
        let handle = server.spawn(token.clone());
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(10), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))), "Server should shut down cleanly");
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let server = GreeksServer::new(
            "greeksd",
            ServerConfig::websocket_only("127.0.0.1", port),
            Arc::new(InMemoryStore::new()),
            Duration::from_millis(500),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server.run(CancellationToken::new()),
        )
        .await
        .unwrap();
        assert_matches!(result, Err(ServerError::BindError { .. }));
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let server = GreeksServer::new(
            "greeksd",
            ServerConfig {
                host: "127.0.0.1".to_string(),
                http_port: None,
                websocket_port: None,
            },
            Arc::new(InMemoryStore::new()),
            Duration::from_millis(500),
        );

        assert!(server.run(CancellationToken::new()).await.is_ok());
        assert!(!server.is_running());
    }
}
