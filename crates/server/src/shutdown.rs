//! Shutdown coordination
//!
//! One root [`CancellationToken`] per process. Each component receives a
//! child token and may hand grandchildren to its own tasks, so cancelling the
//! root reaches everything while a component can still stop its own subtree
//! without touching siblings.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owner of the root shutdown token
#[derive(Clone, Default)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller that cancels itself on Ctrl+C, or SIGTERM on Unix
    pub fn with_ctrl_c() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            match wait_for_signal().await {
                Ok(signal) => {
                    info!(signal, "Received shutdown signal, initiating graceful shutdown...");
                    token.cancel();
                }
                Err(e) => {
                    warn!("Failed to listen for shutdown signals: {}", e);
                }
            }
        });

        controller
    }

    /// Token cancelled together with the root, and cancellable on its own
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn shutdown(&self) {
        info!("Manual shutdown triggered");
        self.token.cancel();
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_shutdown_reaches_children() {
        let controller = ShutdownController::new();
        let child = controller.child_token();
        let grandchild = child.child_token();

        assert!(!grandchild.is_cancelled());

        controller.shutdown();

        assert!(child.is_cancelled());
        grandchild.cancelled().await;
    }

    #[tokio::test]
    async fn test_child_cancel_is_local() {
        let controller = ShutdownController::new();
        let http = controller.child_token();
        let ws = controller.child_token();

        http.cancel();

        assert!(http.is_cancelled());
        assert!(!ws.is_cancelled());
        assert!(!controller.child_token().is_cancelled());
    }
}
