//! AWS Cost Exporter
//!
//! Periodically queries AWS Cost Explorer for monthly blended cost and
//! publishes the figures as Prometheus gauges.

pub mod billing;
pub mod config;
pub mod error;
pub mod metrics;
pub mod refresher;
pub mod server;
pub mod state;
pub mod util;

pub use config::Config;
pub use refresher::Refresher;
pub use state::AppState;

/// Exporter version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
