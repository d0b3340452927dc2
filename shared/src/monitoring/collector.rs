//! Periodic metrics collector.
//!
//! On every tick the collector gathers a batch of system and application
//! samples, persists the batch and hands it to the alert manager. The
//! tick is the only place alert state advances, so triggers and resolves
//! are serialized by construction.

use crate::config::CollectorConfig;
use crate::logging::SystemLogger;
use crate::models::MetricSample;
use crate::monitoring::alerts::{AlertEvent, AlertManager};
use crate::storage::SqliteMetricStore;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One-minute load average parsed from `/proc/loadavg` content.
///
/// The file starts with three whitespace-separated load figures; only
/// the first is sampled.
#[must_use]
pub fn parse_loadavg(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

/// Memory usage percentage parsed from `/proc/meminfo` content.
///
/// Computed as `(MemTotal - MemAvailable) / MemTotal`, which accounts
/// for reclaimable page cache the way `free` does.
#[must_use]
pub fn parse_meminfo(content: &str) -> Option<f64> {
    let mut total = None;
    let mut available = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("MemTotal:") => total = parts.next()?.parse::<f64>().ok(),
            Some("MemAvailable:") => available = parts.next()?.parse::<f64>().ok(),
            _ => {}
        }
    }

    let (total, available) = (total?, available?);
    if total <= 0.0 {
        return None;
    }
    Some((total - available) / total * 100.0)
}

fn disk_usage_percent(path: &Path) -> Option<f64> {
    let total = fs2::total_space(path).ok()?;
    let available = fs2::available_space(path).ok()?;
    if total == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    Some((total - available) as f64 / total as f64 * 100.0)
}

fn count_videos(dir: &Path) -> Option<u64> {
    let entries = std::fs::read_dir(dir).ok()?;
    let count = entries
        .flatten()
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
        })
        .count() as u64;
    Some(count)
}

fn count_credentials(file: &Path) -> Option<u64> {
    let content = std::fs::read_to_string(file).ok()?;
    let count = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count() as u64;
    Some(count)
}

fn log_dir_size_mb(dir: &Path) -> Option<f64> {
    let entries = std::fs::read_dir(dir).ok()?;
    let bytes: u64 = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().contains(".log"))
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum();
    #[allow(clippy::cast_precision_loss)]
    Some(bytes as f64 / (1024.0 * 1024.0))
}

struct CollectorTask {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Periodic sampler of system and application metrics.
///
/// `start` and `stop` are idempotent. The collector shares its alert
/// manager with the dashboard, which only reads alert state.
pub struct MetricsCollector {
    config: CollectorConfig,
    store: SqliteMetricStore,
    alerts: Arc<AlertManager>,
    logger: Arc<SystemLogger>,
    task: Mutex<Option<CollectorTask>>,
}

impl MetricsCollector {
    /// Creates a collector over the given store, rules and logger.
    #[must_use]
    pub fn new(
        config: CollectorConfig,
        store: SqliteMetricStore,
        alerts: Arc<AlertManager>,
        logger: Arc<SystemLogger>,
    ) -> Self {
        Self {
            config,
            store,
            alerts,
            logger,
            task: Mutex::new(None),
        }
    }

    /// Gathers one batch of samples.
    ///
    /// A probe whose source is unavailable (missing directory, absent
    /// `/proc` file) is skipped rather than reported as zero; the batch
    /// simply omits that metric.
    #[must_use]
    pub fn gather(&self) -> Vec<MetricSample> {
        let mut samples = Vec::new();

        if let Some(load) = std::fs::read_to_string("/proc/loadavg")
            .ok()
            .as_deref()
            .and_then(parse_loadavg)
        {
            samples.push(MetricSample::new("system.load_avg", load, "load"));
        }

        if let Some(memory) = std::fs::read_to_string("/proc/meminfo")
            .ok()
            .as_deref()
            .and_then(parse_meminfo)
        {
            samples.push(MetricSample::new("system.memory_usage", memory, "percent"));
        }

        if let Some(disk) = disk_usage_percent(&self.config.log_dir) {
            samples.push(MetricSample::new("system.disk_usage", disk, "percent"));
        }

        if let Some(videos) = count_videos(&self.config.content_dir) {
            #[allow(clippy::cast_precision_loss)]
            samples.push(MetricSample::new(
                "content.video_count",
                videos as f64,
                "count",
            ));
        }

        if let Some(keys) = count_credentials(&self.config.credentials_file) {
            #[allow(clippy::cast_precision_loss)]
            samples.push(MetricSample::new("api.key_count", keys as f64, "count"));
        }

        if let Some(size) = log_dir_size_mb(&self.config.log_dir) {
            samples.push(MetricSample::new("logging.total_size_mb", size, "mb"));
        }

        samples
    }

    /// Runs one collection pass: gather, persist, evaluate alerts.
    ///
    /// Persistence failures are logged and do not stop alert evaluation;
    /// an alert on a stale sample is better than no alert.
    pub async fn tick(&self) {
        let samples = self.gather();
        if samples.is_empty() {
            tracing::warn!("Metrics collection produced no samples");
            return;
        }

        if let Err(error) = self.store.insert_batch(&samples).await {
            tracing::error!(%error, "Failed to persist metric batch");
            self.logger.log(
                crate::models::LogLevel::Error,
                "monitoring",
                &format!("Failed to persist metric batch: {error}"),
                None,
                None,
                None,
            );
        }

        for event in self.alerts.evaluate(&samples) {
            match event {
                AlertEvent::Triggered(alert) => {
                    self.logger.log(
                        alert.severity.log_level(),
                        "monitoring",
                        &format!(
                            "Alert triggered: {} ({} = {:.2}, threshold {:.2})",
                            alert.name, alert.metric, alert.current_value, alert.threshold
                        ),
                        None,
                        None,
                        None,
                    );
                }
                AlertEvent::Resolved(alert) => {
                    self.logger.log(
                        crate::models::LogLevel::Info,
                        "monitoring",
                        &format!(
                            "Alert resolved: {} ({} = {:.2})",
                            alert.name, alert.metric, alert.current_value
                        ),
                        None,
                        None,
                        None,
                    );
                }
            }
        }
    }

    /// Starts the periodic sampling task. No-op if already running.
    pub fn start(self: &Arc<Self>) {
        let mut task = self
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let collector = Arc::clone(self);
        let join = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(collector.config.interval_secs.max(1)));
            loop {
                tokio::select! {
                    _ = interval.tick() => collector.tick().await,
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        *task = Some(CollectorTask { shutdown_tx, join });
        tracing::info!(
            interval_secs = self.config.interval_secs,
            "Metrics collector started"
        );
    }

    /// Stops the periodic sampling task. No-op if not running.
    pub async fn stop(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.shutdown_tx.send(true);
            if tokio::time::timeout(Duration::from_secs(5), task.join)
                .await
                .is_err()
            {
                tracing::warn!("Metrics collector did not stop in time");
            }
        }
    }

    /// The alert manager this collector evaluates against.
    #[must_use]
    pub fn alerts(&self) -> &Arc<AlertManager> {
        &self.alerts
    }
}
