//! Cost slots
//!
//! The fixed set of monthly cost gauges the exporter can publish.

use std::fmt;

/// A named cost gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricSlot {
    /// Previous calendar month
    LastMonth,
    /// Current month to date
    ThisMonth,
    /// The month before the previous one
    BeforeLastMonth,
}

impl MetricSlot {
    /// All slots, in refresh order
    pub const ALL: [MetricSlot; 3] = [
        MetricSlot::LastMonth,
        MetricSlot::ThisMonth,
        MetricSlot::BeforeLastMonth,
    ];

    /// Prometheus metric name
    pub const fn metric_name(self) -> &'static str {
        match self {
            MetricSlot::LastMonth => "aws_cost_last_month",
            MetricSlot::ThisMonth => "aws_cost_this_month",
            MetricSlot::BeforeLastMonth => "aws_cost_before_last_month",
        }
    }

    /// HELP text for the gauge
    pub const fn help(self) -> &'static str {
        match self {
            MetricSlot::LastMonth => "Cost from AWS for last month",
            MetricSlot::ThisMonth => "Cost from AWS for this month",
            MetricSlot::BeforeLastMonth => "Cost from AWS for the month before last month",
        }
    }

    /// Environment variable whose presence enables the slot
    pub const fn env_flag(self) -> &'static str {
        match self {
            MetricSlot::LastMonth => "METRIC_COST_LAST_MONTH",
            MetricSlot::ThisMonth => "METRIC_COST_THIS_MONTH",
            MetricSlot::BeforeLastMonth => "METRIC_COST_BEFORE_LAST_MONTH",
        }
    }

    /// Short label used in logs and self-metrics
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricSlot::LastMonth => "last_month",
            MetricSlot::ThisMonth => "this_month",
            MetricSlot::BeforeLastMonth => "before_last_month",
        }
    }
}

impl fmt::Display for MetricSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slots enabled for this process, fixed at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSet {
    slots: Vec<MetricSlot>,
}

impl SlotSet {
    /// Build from any iterator, deduplicated and kept in refresh order
    pub fn new(slots: impl IntoIterator<Item = MetricSlot>) -> Self {
        let mut slots: Vec<MetricSlot> = slots.into_iter().collect();
        slots.sort();
        slots.dedup();
        Self { slots }
    }

    /// Every slot enabled
    pub fn all() -> Self {
        Self::new(MetricSlot::ALL)
    }

    pub fn contains(&self, slot: MetricSlot) -> bool {
        self.slots.contains(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MetricSlot> + '_ {
        self.slots.iter().copied()
    }
}
