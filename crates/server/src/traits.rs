//! Common lifecycle for every long-running listener or loop

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// A component that runs until its shutdown token is cancelled.
///
/// Implementors bind in `run`, serve until `shutdown` fires, drain whatever
/// they own and then return `Ok(())`. An `Err` means the component could
/// not start or hit a fatal error.
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Short name for logs (e.g. "http", "websocket", "publisher")
    fn name(&self) -> &str;

    /// Bound address while running; `None` before bind, after shutdown, or
    /// for components that do not listen.
    fn address(&self) -> Option<SocketAddr>;

    fn is_running(&self) -> bool;

    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// Convenience methods available on every [`Server`]
pub trait ServerExt: Server + Sized {
    /// Run on a new task until `shutdown` is cancelled
    fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

impl<T: Server + Sized> ServerExt for T {}
