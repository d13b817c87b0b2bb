//! Refresher integration tests

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use aws_cost_exporter::metrics::MetricSlot;
use aws_cost_exporter::refresher::SlotOutcome;
use aws_cost_exporter::{AppState, Refresher};

use crate::support::{config_with, date, state_with, value_line, GatedCostSource};

fn all_slots() -> [MetricSlot; 3] {
    MetricSlot::ALL
}

#[tokio::test]
async fn test_failed_slot_keeps_previous_values() {
    let (state, source) = state_with(&all_slots());
    let refresher = Refresher::new(state.clone());
    let today = date(2025, 1, 20);

    source.respond(date(2025, 1, 1), "11");
    source.respond(date(2024, 12, 1), "22.5");
    source.respond(date(2024, 11, 1), "33.75");
    assert_eq!(refresher.run_once(today).await.updated(), 3);

    // This month's query now fails, the others return new figures
    source.fail(date(2025, 1, 1));
    source.respond(date(2024, 12, 1), "23");
    let report = refresher.run_once(today).await;
    assert_eq!(report.failed(), vec![MetricSlot::ThisMonth]);

    let body = state.metrics().render();
    assert_eq!(value_line(&body, "aws_cost_this_month"), Some("aws_cost_this_month 11"));
    assert_eq!(value_line(&body, "aws_cost_last_month"), Some("aws_cost_last_month 23"));
    assert_eq!(
        value_line(&body, "aws_cost_before_last_month"),
        Some("aws_cost_before_last_month 33.75")
    );
}

#[tokio::test]
async fn test_january_queries_previous_year() {
    let (state, source) = state_with(&all_slots());
    Refresher::new(state).run_once(date(2025, 1, 20)).await;

    let calls = source.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!((calls[0].start, calls[0].end), (date(2024, 12, 1), date(2025, 1, 1)));
    assert_eq!((calls[1].start, calls[1].end), (date(2025, 1, 1), date(2025, 1, 20)));
    assert_eq!((calls[2].start, calls[2].end), (date(2024, 11, 1), date(2024, 12, 1)));
}

#[tokio::test]
async fn test_disabled_slot_never_exposed() {
    let (state, source) = state_with(&[MetricSlot::LastMonth]);
    source.respond(date(2024, 7, 1), "1");
    source.respond(date(2024, 8, 1), "2");
    source.respond(date(2024, 6, 1), "3");

    let refresher = Refresher::new(state.clone());
    refresher.run_once(date(2024, 8, 9)).await;
    refresher.run_once(date(2024, 8, 10)).await;

    let body = state.metrics().render();
    assert!(value_line(&body, "aws_cost_last_month").is_some());
    assert!(!body.contains("aws_cost_this_month"));
    assert!(!body.contains("aws_cost_before_last_month"));
    assert!(source.calls().iter().all(|p| p.start == date(2024, 7, 1)));
}

#[tokio::test]
async fn test_malformed_amount_is_a_slot_failure() {
    let (state, source) = state_with(&[MetricSlot::LastMonth]);
    source.respond(date(2024, 7, 1), "n/a");

    let report = Refresher::new(state.clone()).run_once(date(2024, 8, 9)).await;
    assert!(matches!(
        report.outcome(MetricSlot::LastMonth),
        Some(SlotOutcome::Failed(_))
    ));
    assert!(value_line(&state.metrics().render(), "aws_cost_last_month").is_none());
}

#[tokio::test]
async fn test_run_records_self_metrics() {
    let (state, source) = state_with(&[MetricSlot::LastMonth, MetricSlot::ThisMonth]);
    source.respond(date(2024, 7, 1), "1");
    Refresher::new(state.clone()).run_once(date(2024, 8, 9)).await;

    let body = state.metrics().render();
    assert_eq!(
        value_line(&body, "aws_cost_exporter_refresh_runs_total"),
        Some("aws_cost_exporter_refresh_runs_total 1")
    );
    assert!(body.contains(r#"aws_cost_exporter_refresh_errors_total{slot="this_month"} 1"#));
}

#[tokio::test]
async fn test_concurrent_runs_are_serialized() {
    let (state, source) = state_with(&all_slots());
    source.respond(date(2024, 7, 1), "1");
    source.respond(date(2024, 8, 1), "2");
    source.respond(date(2024, 6, 1), "3");

    let refresher = Refresher::new(state);
    let (a, b) = tokio::join!(
        refresher.run_once(date(2024, 8, 9)),
        refresher.run_once(date(2024, 8, 9))
    );
    assert_eq!(a.updated() + b.updated(), 6);

    // Each run issues its three queries back to back
    let starts: Vec<_> = source.calls().iter().map(|p| p.start).collect();
    assert_eq!(
        starts,
        vec![
            date(2024, 7, 1),
            date(2024, 8, 1),
            date(2024, 6, 1),
            date(2024, 7, 1),
            date(2024, 8, 1),
            date(2024, 6, 1),
        ]
    );
}

#[tokio::test]
async fn test_separate_refreshers_share_run_lock() {
    let (state, source) = state_with(&[MetricSlot::LastMonth, MetricSlot::ThisMonth]);
    source.respond(date(2024, 7, 1), "1");
    source.respond(date(2024, 8, 1), "2");

    let first = Refresher::new(state.clone());
    let second = Refresher::new(state);
    tokio::join!(
        first.run_once(date(2024, 8, 9)),
        second.run_once(date(2024, 8, 9))
    );

    let starts: Vec<_> = source.calls().iter().map(|p| p.start).collect();
    assert_eq!(
        starts,
        vec![
            date(2024, 7, 1),
            date(2024, 8, 1),
            date(2024, 7, 1),
            date(2024, 8, 1),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_in_flight_run() {
    let source = Arc::new(GatedCostSource::default());
    let state = AppState::new(config_with(&[MetricSlot::LastMonth]), source.clone());
    let (tx, rx) = watch::channel(false);
    let handle = Refresher::new(state.clone()).spawn(rx);

    source.wait_entered().await;
    tx.send(true).unwrap();

    // Still blocked inside the query
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!handle.is_finished());
    assert!(value_line(&state.metrics().render(), "aws_cost_last_month").is_none());

    source.release();
    handle.await.unwrap();

    assert_eq!(
        value_line(&state.metrics().render(), "aws_cost_last_month"),
        Some("aws_cost_last_month 77")
    );
}

#[tokio::test(start_paused = true)]
async fn test_periodic_schedule_and_shutdown() {
    let (state, source) = state_with(&[MetricSlot::LastMonth]);
    let period = state.config().refresh.period();
    let (tx, rx) = watch::channel(false);
    let handle = Refresher::new(state.clone()).spawn(rx);

    // Nothing before the startup delay
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(source.calls().is_empty());

    // First run right after the delay
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(source.calls().len(), 1);

    // One more run per period
    tokio::time::sleep(period).await;
    assert_eq!(source.calls().len(), 2);

    tx.send(true).unwrap();
    handle.await.unwrap();

    tokio::time::sleep(period * 2).await;
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn test_state_clones_share_metrics() {
    let (state, _source) = state_with(&[MetricSlot::ThisMonth]);
    let clone: AppState = state.clone();
    clone.metrics().set(MetricSlot::ThisMonth, 4.0);
    assert!(value_line(&state.metrics().render(), "aws_cost_this_month").is_some());
}
