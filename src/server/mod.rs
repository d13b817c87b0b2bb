//! Server implementation
//!
//! Axum listener for the metrics and health endpoints.

mod routes;

use anyhow::{Context, Result};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

use crate::state::AppState;

pub use routes::build_router;

/// Serve HTTP on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%local_addr, "HTTP server accepting connections");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}
