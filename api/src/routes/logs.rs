//! Recent-logs endpoint.

use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::{LogLevel, LogRecord};

/// Maximum number of records returned per request.
const RECENT_LIMIT: usize = 50;

/// Query parameters for recent logs.
#[derive(Debug, Deserialize)]
pub struct RecentLogsParams {
    /// Optional level filter (for example "error" or "warning").
    pub level: Option<String>,
}

/// Response for recent-log queries.
#[derive(Debug, Serialize)]
pub struct RecentLogsResponse {
    /// Number of records returned.
    pub count: usize,
    /// The most recent matching records, oldest first.
    pub logs: Vec<LogRecord>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct LogsError {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Creates the recent-logs routes.
pub fn logs_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/logs", get(recent_logs))
        .with_state(state)
}

async fn recent_logs(
    State(state): State<AppState>,
    Query(params): Query<RecentLogsParams>,
) -> Result<Json<RecentLogsResponse>, (StatusCode, Json<LogsError>)> {
    let level = params
        .level
        .as_deref()
        .map(str::parse::<LogLevel>)
        .transpose()
        .map_err(|error| {
            (
                StatusCode::BAD_REQUEST,
                Json(LogsError {
                    error: "invalid_level".to_string(),
                    message: error.to_string(),
                }),
            )
        })?;

    let mut logs = state.logger().search("", level, None, None).map_err(|error| {
        tracing::error!(%error, "Log scan failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LogsError {
                error: "scan_failed".to_string(),
                message: error.to_string(),
            }),
        )
    })?;

    // Keep only the tail of the file.
    if logs.len() > RECENT_LIMIT {
        logs.drain(..logs.len() - RECENT_LIMIT);
    }

    Ok(Json(RecentLogsResponse {
        count: logs.len(),
        logs,
    }))
}
