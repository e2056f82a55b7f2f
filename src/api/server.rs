//! Portal API server lifecycle — starts/stops the axum HTTP server.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. The handle also exposes the bound address, which matters when
//! binding port 0 in tests.

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::portal_router;
use crate::api::types::ApiContext;

/// Handle to a running portal API server.
pub struct PortalServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PortalServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Portal API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish draining.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Start the portal API server on the given address.
///
/// Builds the full `portal_router`, binds, and spawns the axum server in a
/// background tokio task. Returns a `PortalServer` handle with the bound
/// address and a shutdown channel.
pub async fn start_portal_server(
    ctx: ApiContext,
    addr: SocketAddr,
) -> Result<PortalServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind portal API server: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(%addr, "Portal API server binding");

    let app = portal_router(ctx);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Portal API server received shutdown signal");
        };

        tracing::info!(%addr, "Portal API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Portal API server error: {e}");
        }

        tracing::info!("Portal API server stopped");
    });

    Ok(PortalServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
