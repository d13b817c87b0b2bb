//! Shared application state
//!
//! Built once at startup and handed to both the refresher and the HTTP
//! server.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::billing::CostSource;
use crate::config::Config;
use crate::metrics::{CostMetrics, SlotSet};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    metrics: CostMetrics,
    source: Arc<dyn CostSource>,
    /// Held for the whole of a refresh run; one writer at a time
    refresh_lock: Mutex<()>,
}

impl AppState {
    /// Build state from resolved configuration and a cost source
    pub fn new(config: Config, source: Arc<dyn CostSource>) -> Self {
        let metrics = CostMetrics::new(config.metrics.enabled_slots());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                metrics,
                source,
                refresh_lock: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn metrics(&self) -> &CostMetrics {
        &self.inner.metrics
    }

    pub fn slots(&self) -> &SlotSet {
        self.inner.metrics.slots()
    }

    pub fn source(&self) -> Arc<dyn CostSource> {
        Arc::clone(&self.inner.source)
    }

    /// Serializes refresh runs across every refresher sharing this state
    pub fn refresh_lock(&self) -> &Mutex<()> {
        &self.inner.refresh_lock
    }
}
