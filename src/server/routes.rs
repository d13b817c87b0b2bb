//! HTTP routes
//!
//! - GET /metrics/ - cost snapshot in the text exposition format
//! - GET /health   - liveness, independent of refresh state

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};

use crate::metrics::CONTENT_TYPE_LATEST;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics/", get(metrics_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health))
        .with_state(state)
}

/// Render whatever is currently stored; never touches the billing API
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, CONTENT_TYPE_LATEST)],
        state.metrics().render(),
    )
}

async fn health() -> &'static str {
    "OK"
}
