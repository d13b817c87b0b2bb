//! Periodic cost refresher
//!
//! Queries the cost source for every enabled slot on a fixed schedule and
//! writes the results into the cost gauges. A failing slot keeps its
//! previous value and does not stop the remaining slots.

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::billing::{BillingPeriod, CostSource};
use crate::error::FetchError;
use crate::metrics::MetricSlot;
use crate::state::AppState;

/// Result of refreshing one slot
#[derive(Debug)]
pub enum SlotOutcome {
    /// New value stored
    Updated(f64),
    /// Query failed, previous value kept
    Failed(FetchError),
}

/// Per-slot outcomes of one refresh run, in refresh order
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub outcomes: Vec<(MetricSlot, SlotOutcome)>,
}

impl RefreshReport {
    pub fn outcome(&self, slot: MetricSlot) -> Option<&SlotOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, outcome)| outcome)
    }

    pub fn updated(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SlotOutcome::Updated(_)))
            .count()
    }

    pub fn failed(&self) -> Vec<MetricSlot> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SlotOutcome::Failed(_)))
            .map(|(s, _)| *s)
            .collect()
    }
}

/// Refreshes the cost gauges
#[derive(Clone)]
pub struct Refresher {
    state: AppState,
}

impl Refresher {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Run one refresh with periods anchored to `today`
    pub async fn run_once(&self, today: NaiveDate) -> RefreshReport {
        let _guard = self.state.refresh_lock().lock().await;

        let span = info_span!("refresh", %today);
        async {
            info!(slots = self.state.slots().len(), "Calculating costs");

            let source = self.state.source();
            let mut report = RefreshReport::default();
            for slot in self.state.slots().iter() {
                let outcome = self.refresh_slot(source.as_ref(), slot, today).await;
                report.outcomes.push((slot, outcome));
            }

            let failed = report.failed();
            self.state
                .metrics()
                .record_run(&failed, Utc::now().timestamp() as f64);

            info!(
                updated = report.updated(),
                failed = failed.len(),
                "Finished calculating costs"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn refresh_slot(
        &self,
        source: &dyn CostSource,
        slot: MetricSlot,
        today: NaiveDate,
    ) -> SlotOutcome {
        match self.query(source, slot, today).await {
            Ok(amount) => {
                self.state.metrics().set(slot, amount);
                info!(%slot, amount, "Cost updated");
                SlotOutcome::Updated(amount)
            }
            Err(e) => {
                warn!(%slot, error = %e, "Cost refresh failed, keeping previous value");
                SlotOutcome::Failed(e)
            }
        }
    }

    async fn query(
        &self,
        source: &dyn CostSource,
        slot: MetricSlot,
        today: NaiveDate,
    ) -> Result<f64, FetchError> {
        let period = BillingPeriod::for_slot(slot, today)?;

        // Nothing has been billed yet on the first day of a month, and the
        // API rejects an empty interval.
        if period.is_empty() {
            debug!(%slot, %period, "Empty billing period, reporting zero");
            return Ok(0.0);
        }

        let timeout = self.state.config().refresh.timeout();
        tokio::time::timeout(timeout, source.fetch_cost(&period))
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
    }

    /// Spawn the periodic refresh loop.
    ///
    /// The first run happens after the configured startup delay. Shutdown is
    /// checked between runs only, so a run in progress always completes.
    pub fn spawn(self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let refresh = self.state.config().refresh.clone();

            tokio::select! {
                _ = tokio::time::sleep(refresh.startup_delay()) => {}
                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!("Refresher stopped before first run");
                    return;
                }
            }

            let mut interval = tokio::time::interval(refresh.period());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(period_secs = refresh.period_secs, "Refresher started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.run_once(Local::now().date_naive()).await;
                    }
                    _ = shutdown_requested(&mut shutdown_rx) => {
                        break;
                    }
                }
            }

            info!("Refresher stopped");
        })
    }
}

/// Resolves once shutdown is signalled or the sender is gone
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
