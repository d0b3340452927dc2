//! System status endpoint.
//!
//! Aggregates the most recent sample of every metric with the current
//! alert state into one dashboard snapshot. The handler only reads:
//! alert state is advanced by the collector tick, never by a request.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{ActiveAlert, MetricSample};

/// Aggregated system status snapshot.
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    /// Time the snapshot was assembled.
    pub timestamp: DateTime<Utc>,
    /// Most recent sample of every known metric.
    pub metrics: Vec<MetricSample>,
    /// Currently active alerts, sorted by rule name.
    pub alerts: Vec<ActiveAlert>,
    /// Overall health: "healthy" when no alert is active, else "warning".
    pub status: &'static str,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct StatusError {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

// The status value set is part of the external contract: "healthy"
// when no alert is active, "warning" otherwise. Severity detail lives
// in the alerts array, not in this field.
fn overall_status(alerts: &[ActiveAlert]) -> &'static str {
    if alerts.is_empty() {
        "healthy"
    } else {
        "warning"
    }
}

/// Creates the system status routes.
pub fn status_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/system_status", get(system_status))
        .with_state(state)
}

async fn system_status(
    State(state): State<AppState>,
) -> Result<Json<SystemStatusResponse>, (StatusCode, Json<StatusError>)> {
    let metrics = state.metric_store().latest().await.map_err(|error| {
        tracing::error!(%error, "Latest-metrics query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusError {
                error: "query_failed".to_string(),
                message: error.to_string(),
            }),
        )
    })?;

    let alerts = state.alerts().active_alerts();
    let status = overall_status(&alerts);

    Ok(Json(SystemStatusResponse {
        timestamp: Utc::now(),
        metrics,
        alerts,
        status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use shared::config::LoggingConfig;
    use shared::logging::SystemLogger;
    use shared::models::{AlertRule, CompareOp, Severity};
    use shared::monitoring::AlertManager;
    use shared::storage::SqliteMetricStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state(dir: &std::path::Path, alerts: AlertManager) -> AppState {
        let store = SqliteMetricStore::open_in_memory().await.unwrap();
        let logger = Arc::new(
            SystemLogger::start(LoggingConfig {
                log_dir: dir.to_path_buf(),
                enable_console: false,
                ..LoggingConfig::default()
            })
            .unwrap(),
        );
        AppState::new(store, Arc::new(alerts), logger)
    }

    async fn get_status(state: AppState) -> serde_json::Value {
        let response = status_routes(state)
            .oneshot(
                Request::builder()
                    .uri("/api/system_status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_status_healthy_with_no_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), AlertManager::with_default_rules()).await;
        state
            .metric_store()
            .insert_batch(&[MetricSample::new("system.load_avg", 0.5, "load")])
            .await
            .unwrap();

        let status = get_status(state).await;

        assert_eq!(status["status"], "healthy");
        assert_eq!(status["alerts"].as_array().unwrap().len(), 0);
        assert_eq!(status["metrics"].as_array().unwrap().len(), 1);
        assert!(status["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_status_warning_with_active_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let manager = AlertManager::new(vec![
            AlertRule::new(
                "high_memory",
                "system.memory_usage",
                CompareOp::Gt,
                80.0,
                Severity::Warning,
            ),
            AlertRule::new(
                "critical_memory",
                "system.memory_usage",
                CompareOp::Gt,
                90.0,
                Severity::Critical,
            ),
        ]);

        // Warning-severity alert active.
        manager.evaluate(&[MetricSample::new("system.memory_usage", 85.0, "percent")]);
        let state = test_state(dir.path(), manager).await;
        let status = get_status(state.clone()).await;
        assert_eq!(status["status"], "warning");

        // Critical-severity alert joins in; the status value stays
        // "warning" and severity detail lives in the alerts array.
        state
            .alerts()
            .evaluate(&[MetricSample::new("system.memory_usage", 95.0, "percent")]);
        let status = get_status(state).await;
        assert_eq!(status["status"], "warning");
        assert_eq!(status["alerts"].as_array().unwrap().len(), 2);
        assert_eq!(status["alerts"][0]["severity"], "critical");
    }

    #[tokio::test]
    async fn test_status_value_set_is_healthy_or_warning() {
        let dir = tempfile::tempdir().unwrap();
        let manager = AlertManager::new(vec![AlertRule::new(
            "critical_disk",
            "system.disk_usage",
            CompareOp::Gt,
            95.0,
            Severity::Critical,
        )]);

        // A lone critical-severity alert still reports "warning".
        manager.evaluate(&[MetricSample::new("system.disk_usage", 99.0, "percent")]);
        let state = test_state(dir.path(), manager).await;
        let status = get_status(state).await;
        assert_eq!(status["status"], "warning");
    }

    #[test]
    fn test_overall_status_empty_is_healthy() {
        assert_eq!(overall_status(&[]), "healthy");
    }
}
