//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use shared::logging::SystemLogger;
use shared::monitoring::AlertManager;
use shared::storage::SqliteMetricStore;
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// The dashboard is strictly read-only: handlers query the metric store,
/// snapshot alert state and scan the log file, but never write to any of
/// them. Alert state is advanced exclusively by the collector tick.
#[derive(Clone)]
pub struct AppState {
    metric_store: SqliteMetricStore,
    alerts: Arc<AlertManager>,
    logger: Arc<SystemLogger>,
}

impl AppState {
    /// Creates a new application state over the given services.
    #[must_use]
    pub fn new(
        metric_store: SqliteMetricStore,
        alerts: Arc<AlertManager>,
        logger: Arc<SystemLogger>,
    ) -> Self {
        Self {
            metric_store,
            alerts,
            logger,
        }
    }

    /// Returns the metric store.
    #[must_use]
    pub fn metric_store(&self) -> &SqliteMetricStore {
        &self.metric_store
    }

    /// Returns the alert manager.
    #[must_use]
    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    /// Returns the system logger.
    #[must_use]
    pub fn logger(&self) -> &SystemLogger {
        &self.logger
    }
}
