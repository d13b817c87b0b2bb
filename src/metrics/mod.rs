//! Metrics and observability
//!
//! Prometheus gauges for the cost slots plus refresh self-metrics.

mod exporter;
mod slots;

pub use exporter::*;
pub use slots::{MetricSlot, SlotSet};
