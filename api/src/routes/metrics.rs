//! Metric history query endpoint.

use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::MetricSample;

/// Query parameters for metric history.
#[derive(Debug, Deserialize)]
pub struct MetricHistoryParams {
    /// Name of the metric to query (default: "`system.load_avg`").
    pub metric: Option<String>,
    /// Lookback window in hours (default: 24).
    pub hours: Option<u32>,
}

/// Response for metric history queries.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricHistoryResponse {
    /// The queried metric name.
    pub metric: String,
    /// The lookback window in hours.
    pub hours: u32,
    /// Number of samples in the window.
    pub count: usize,
    /// Samples in the window, most recent first.
    pub samples: Vec<MetricSample>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct MetricError {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Creates the metric history routes.
pub fn metrics_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/metrics", get(metric_history))
        .with_state(state)
}

async fn metric_history(
    State(state): State<AppState>,
    Query(params): Query<MetricHistoryParams>,
) -> Result<Json<MetricHistoryResponse>, (StatusCode, Json<MetricError>)> {
    let metric = params
        .metric
        .unwrap_or_else(|| "system.load_avg".to_string());
    let hours = params.hours.unwrap_or(24);

    let samples = state
        .metric_store()
        .query(&metric, hours)
        .await
        .map_err(|error| {
            tracing::error!(%error, metric, "Metric history query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MetricError {
                    error: "query_failed".to_string(),
                    message: error.to_string(),
                }),
            )
        })?;

    Ok(Json(MetricHistoryResponse {
        metric,
        hours,
        count: samples.len(),
        samples,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use shared::config::LoggingConfig;
    use shared::logging::SystemLogger;
    use shared::monitoring::AlertManager;
    use shared::storage::SqliteMetricStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state(dir: &std::path::Path) -> AppState {
        let store = SqliteMetricStore::open_in_memory().await.unwrap();
        let logger = Arc::new(
            SystemLogger::start(LoggingConfig {
                log_dir: dir.to_path_buf(),
                enable_console: false,
                ..LoggingConfig::default()
            })
            .unwrap(),
        );
        AppState::new(store, Arc::new(AlertManager::with_default_rules()), logger)
    }

    #[tokio::test]
    async fn test_metric_history_window_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        state
            .metric_store()
            .insert_batch(&[
                MetricSample::new("system.memory_usage", 40.0, "percent")
                    .with_timestamp(Utc::now() - Duration::hours(30)),
                MetricSample::new("system.memory_usage", 55.0, "percent")
                    .with_timestamp(Utc::now() - Duration::hours(1)),
                MetricSample::new("system.memory_usage", 60.0, "percent"),
            ])
            .await
            .unwrap();

        let response = metrics_routes(state)
            .oneshot(
                Request::builder()
                    .uri("/api/metrics?metric=system.memory_usage&hours=24")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: MetricHistoryResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(parsed.metric, "system.memory_usage");
        assert_eq!(parsed.count, 2);
        assert_eq!(parsed.samples[0].metric_value, 60.0);
        assert_eq!(parsed.samples[1].metric_value, 55.0);
    }

    #[tokio::test]
    async fn test_metric_history_defaults_to_load_avg() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        state
            .metric_store()
            .insert_batch(&[MetricSample::new("system.load_avg", 1.7, "load")])
            .await
            .unwrap();

        let response = metrics_routes(state)
            .oneshot(
                Request::builder()
                    .uri("/api/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: MetricHistoryResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(parsed.metric, "system.load_avg");
        assert_eq!(parsed.count, 1);
    }

    #[tokio::test]
    async fn test_metric_history_unknown_metric_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let response = metrics_routes(state)
            .oneshot(
                Request::builder()
                    .uri("/api/metrics?metric=no.such.metric")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: MetricHistoryResponse = serde_json::from_slice(&body).unwrap();

        // Default window applies and an unknown name is not an error.
        assert_eq!(parsed.hours, 24);
        assert_eq!(parsed.count, 0);
    }
}
