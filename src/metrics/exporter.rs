//! Prometheus cost exporter
//!
//! Owns a process-local Prometheus recorder holding the cost gauges. The
//! recorder is never installed globally, so each `CostMetrics` is an
//! independent registry.

use metrics::{counter, describe_counter, describe_gauge, gauge, with_local_recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::collections::BTreeMap;

use super::slots::{MetricSlot, SlotSet};

/// Content type of the text exposition format
pub const CONTENT_TYPE_LATEST: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Completed refresh runs
pub const REFRESH_RUNS_TOTAL: &str = "aws_cost_exporter_refresh_runs_total";

/// Failed slot refreshes. Labels: `slot`.
pub const REFRESH_ERRORS_TOTAL: &str = "aws_cost_exporter_refresh_errors_total";

/// Unix time of the last completed refresh run
pub const LAST_REFRESH_TIMESTAMP: &str = "aws_cost_exporter_last_refresh_timestamp_seconds";

/// Cost gauges for the enabled slots
pub struct CostMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    slots: SlotSet,
}

impl CostMetrics {
    /// Create the registry and describe the enabled slots.
    ///
    /// Gauges are only registered on their first write, so an enabled slot
    /// that has never been refreshed is absent from the rendered output.
    pub fn new(slots: SlotSet) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        with_local_recorder(&recorder, || {
            for slot in slots.iter() {
                describe_gauge!(slot.metric_name(), slot.help());
            }
            describe_counter!(REFRESH_RUNS_TOTAL, "Completed cost refresh runs");
            describe_counter!(REFRESH_ERRORS_TOTAL, "Failed cost queries by slot");
            describe_gauge!(
                LAST_REFRESH_TIMESTAMP,
                "Unix time of the last completed cost refresh run"
            );
        });

        Self {
            recorder,
            handle,
            slots,
        }
    }

    /// Enabled slots
    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    /// Store a slot value, overwriting the previous one.
    ///
    /// Writes to disabled slots are dropped.
    pub fn set(&self, slot: MetricSlot, value: f64) -> bool {
        if !self.slots.contains(slot) {
            return false;
        }
        with_local_recorder(&self.recorder, || {
            gauge!(slot.metric_name()).set(value);
        });
        true
    }

    /// Record the outcome of one refresh run
    pub fn record_run(&self, failed: &[MetricSlot], finished_at_secs: f64) {
        with_local_recorder(&self.recorder, || {
            counter!(REFRESH_RUNS_TOTAL).increment(1);
            for slot in failed {
                counter!(REFRESH_ERRORS_TOTAL, "slot" => slot.as_str()).increment(1);
            }
            gauge!(LAST_REFRESH_TIMESTAMP).set(finished_at_secs);
        });
    }

    /// Render the current snapshot in the text exposition format.
    ///
    /// Metric families are sorted by name and samples within a family by
    /// their full line, so unchanged state always renders identically.
    pub fn render(&self) -> String {
        sort_exposition(&self.handle.render())
    }
}

#[derive(Default)]
struct Family<'a> {
    comments: Vec<&'a str>,
    samples: Vec<&'a str>,
}

/// Reorder exposition text into name-sorted metric families
fn sort_exposition(text: &str) -> String {
    let mut families: BTreeMap<&str, Family<'_>> = BTreeMap::new();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(comment) = line.strip_prefix("# ") {
            // "# HELP <name> ..." / "# TYPE <name> <kind>"
            let Some(name) = comment.split_whitespace().nth(1) else {
                continue;
            };
            families.entry(name).or_default().comments.push(line);
        } else {
            let name = line
                .split(|c: char| c == '{' || c.is_whitespace())
                .next()
                .unwrap_or(line);
            families.entry(name).or_default().samples.push(line);
        }
    }

    let mut out = String::with_capacity(text.len());
    for family in families.values_mut() {
        family.samples.sort_unstable();
        for line in family.comments.iter().chain(family.samples.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
