//! Health check endpoint.
//!
//! Load-balancer liveness plus a small pipeline vital sign: whether the
//! metric store answers, and how many records the logging queue has
//! dropped since startup.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the metric store is reachable, else "degraded".
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Records dropped by the logging queue since startup.
    pub dropped_records: u64,
    /// Total samples in the metric store; absent when the store is
    /// unreachable.
    pub stored_samples: Option<u64>,
}

/// Creates the health check routes.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check handler.
///
/// A failing store query degrades the status instead of failing the
/// request, so probes still get an answer while the pipeline limps.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stored_samples = match state.metric_store().count().await {
        Ok(count) => Some(count),
        Err(error) => {
            tracing::error!(%error, "Health probe could not reach the metric store");
            None
        }
    };

    Json(HealthResponse {
        status: if stored_samples.is_some() {
            "healthy"
        } else {
            "degraded"
        },
        service: "clipwatch-api",
        version: env!("CARGO_PKG_VERSION"),
        dropped_records: state.logger().dropped_records(),
        stored_samples,
    })
}
