//! Clipwatch Dashboard API Server
//!
//! This crate provides the read-only HTTP query surface over the
//! Clipwatch observability pipeline: metric history, the aggregated
//! system status and recent log records. It also hosts the metrics
//! collector, which is the only component that advances alert state.
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod routes;
mod state;

pub use config::Config;
pub use state::AppState;

use anyhow::Result;
use axum::Router;
use shared::config::{CollectorConfig, LoggingConfig};
use shared::logging::SystemLogger;
use shared::monitoring::{AlertManager, MetricsCollector};
use shared::storage::SqliteMetricStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Runs the Clipwatch dashboard API server.
///
/// Initializes the full pipeline from environment variables: the
/// structured logger, the metric store, the alert manager and the
/// collector, then serves the dashboard until SIGTERM/SIGINT.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The logging pipeline or metric store fails to initialize
/// - The server fails to bind to the configured address
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the Clipwatch dashboard API server with the provided configuration.
///
/// This is useful for testing or when you want to provide configuration programmatically.
///
/// # Errors
///
/// Returns an error if the pipeline fails to initialize, the server
/// fails to bind or a fatal error occurs during operation.
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let addr = config.socket_addr()?;

    let logger = Arc::new(SystemLogger::start(LoggingConfig::from_env()?)?);
    let collector_config = CollectorConfig::from_env()?;
    let store = SqliteMetricStore::open(&collector_config.db_path).await?;
    let alerts = Arc::new(AlertManager::with_default_rules());

    let collector = Arc::new(MetricsCollector::new(
        collector_config,
        store.clone(),
        Arc::clone(&alerts),
        Arc::clone(&logger),
    ));
    collector.start();

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Clipwatch API server starting"
    );
    logger.log_system_event("startup", "Dashboard API server starting", None);

    let app = create_router(AppState::new(store, alerts, Arc::clone(&logger)));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    collector.stop().await;
    logger.log_system_event("shutdown", "Dashboard API server stopping", None);
    logger.shutdown().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes(state.clone()))
        .merge(routes::metrics_routes(state.clone()))
        .merge(routes::status_routes(state.clone()))
        .merge(routes::logs_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
