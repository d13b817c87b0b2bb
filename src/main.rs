//! AWS Cost Exporter - Entry Point
//!
//! Configuration comes from the environment, or from a TOML file when a
//! path is given as the first argument.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use aws_cost_exporter::billing::CostExplorerSource;
use aws_cost_exporter::{server, AppState, Config, Refresher, VERSION};

/// Application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::from_env().context("Invalid environment configuration")?,
    };

    aws_cost_exporter::util::init_tracing(&config.logging)?;

    let slots = config.metrics.enabled_slots();
    info!(
        version = VERSION,
        region = %config.aws.region,
        period_secs = config.refresh.period_secs,
        slots = ?slots.iter().map(|s| s.metric_name()).collect::<Vec<_>>(),
        "Starting AWS Cost Exporter"
    );
    if slots.is_empty() {
        warn!("No cost metrics enabled; set METRIC_COST_LAST_MONTH, METRIC_COST_THIS_MONTH or METRIC_COST_BEFORE_LAST_MONTH");
    }

    let source = CostExplorerSource::from_config(&config.aws).await;
    let bind_addr = config.server.bind_addr;
    let state = AppState::new(config, Arc::new(source));

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresher = Refresher::new(state.clone()).spawn(shutdown_rx);

    let result = server::serve(listener, state, shutdown_signal()).await;

    // Let an in-flight refresh finish before exiting
    info!("Shutdown signal received, stopping refresher...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = refresher.await {
        error!(error = %e, "Refresher task failed");
    }

    if let Err(e) = &result {
        error!(error = %e, "Server error");
    }
    result?;

    info!("Exporter stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
