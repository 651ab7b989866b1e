//! HTTP server: route table, handlers, CORS middleware and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server stops accepting connections, lets in-flight
//! requests finish, and then returns from [`serve`].

mod cors;
mod routes;

pub use routes::{router, AppState};

use crate::error::Result;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

/// Serves `app` on an already-bound listener until a shutdown signal arrives.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!(addr = %listener.local_addr()?, "AQI proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("AQI proxy stopped");
    Ok(())
}

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM and SIGINT (Ctrl-C).
/// On other platforms only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = sigterm => {},
    }

    info!("Shutdown signal received, draining connections");
}
