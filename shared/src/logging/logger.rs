//! System logger facade.
//!
//! `SystemLogger` is an explicit, constructible service: it owns the
//! bounded queue, spawns the delivery worker over the configured sinks
//! and offers typed convenience calls for the domain events the
//! automation subsystems are required to emit. It also exposes the
//! maintenance surface over the log directory: search, retention sweep
//! and statistics.

use crate::config::LoggingConfig;
use crate::logging::sink::{ConsoleSink, FileSink, LogSink, SinkError};
use crate::logging::worker::{spawn_worker, WorkerHandle};
use crate::models::{LogLevel, LogRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised while starting or maintaining the logging pipeline.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The log directory could not be created. This is fatal: the
    /// pipeline cannot initialize without its storage location.
    #[error("Failed to create log directory {path}: {source}")]
    CreateLogDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file sink could not be opened.
    #[error("Failed to open file sink: {0}")]
    OpenFileSink(#[from] SinkError),

    /// A maintenance operation on the log directory failed.
    #[error("Log directory I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Information about one file in the log directory.
#[derive(Debug, Clone, Serialize)]
pub struct LogFileInfo {
    /// File name relative to the log directory.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Last-modified time.
    pub modified: DateTime<Utc>,
}

/// Snapshot of logging pipeline statistics.
#[derive(Debug, Clone, Serialize)]
pub struct LogStats {
    /// The configured log directory.
    pub log_directory: String,
    /// Records currently buffered in the queue.
    pub queued_records: usize,
    /// Records dropped because the queue was full.
    pub dropped_records: u64,
    /// Files present in the log directory.
    pub log_files: Vec<LogFileInfo>,
}

/// Centralized structured logger.
///
/// Producers call [`SystemLogger::log`] (or a typed convenience method)
/// from any task; the record is stamped and enqueued without ever
/// blocking. When the queue is at capacity the record is dropped and
/// counted, prioritizing producer availability over log durability.
///
/// # Example
///
/// ```no_run
/// use shared::config::LoggingConfig;
/// use shared::logging::SystemLogger;
/// use shared::models::LogLevel;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let logger = SystemLogger::start(LoggingConfig::default())?;
/// logger.log(LogLevel::Info, "api", "Server started", None, None, None);
/// logger.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct SystemLogger {
    tx: mpsc::Sender<LogRecord>,
    dropped: AtomicU64,
    config: LoggingConfig,
    worker: Mutex<Option<WorkerHandle>>,
}

impl SystemLogger {
    /// Creates the log directory, builds the configured sinks and spawns
    /// the delivery worker. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory cannot be created or the
    /// file sink cannot be opened; both prevent the pipeline from
    /// initializing.
    pub fn start(config: LoggingConfig) -> Result<Self, LoggerError> {
        std::fs::create_dir_all(&config.log_dir).map_err(|source| LoggerError::CreateLogDir {
            path: config.log_dir.clone(),
            source,
        })?;

        let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();
        if config.enable_file {
            sinks.push(Box::new(FileSink::new(
                config.active_log_file(),
                config.max_log_size,
                config.backup_count,
            )?));
        }
        if config.enable_console {
            sinks.push(Box::new(ConsoleSink::new()));
        }

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let worker = spawn_worker(rx, sinks);

        Ok(Self {
            tx,
            dropped: AtomicU64::new(0),
            config,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Enqueues an already-built record without blocking.
    ///
    /// On overflow (or after shutdown) the record is dropped silently and
    /// the drop counter incremented.
    pub fn enqueue(&self, record: LogRecord) {
        if self.tx.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Builds a record stamped with the current time and enqueues it.
    pub fn log(
        &self,
        level: LogLevel,
        module: &str,
        message: &str,
        details: Option<HashMap<String, serde_json::Value>>,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) {
        let mut record = LogRecord::new(level, module, message);
        record.details = details;
        record.user_id = user_id.map(str::to_owned);
        record.session_id = session_id.map(str::to_owned);
        self.enqueue(record);
    }

    /// Logs an API call event.
    ///
    /// The detail payload `{endpoint, method, status_code,
    /// response_time_ms}` is part of the external contract.
    pub fn log_api_call(
        &self,
        endpoint: &str,
        method: &str,
        status_code: u16,
        response_time_ms: f64,
        user_id: Option<&str>,
    ) {
        let level = if status_code < 400 {
            LogLevel::Info
        } else {
            LogLevel::Error
        };

        let details = HashMap::from([
            ("endpoint".to_string(), serde_json::json!(endpoint)),
            ("method".to_string(), serde_json::json!(method)),
            ("status_code".to_string(), serde_json::json!(status_code)),
            (
                "response_time_ms".to_string(),
                serde_json::json!(response_time_ms),
            ),
        ]);

        self.log(
            level,
            "api",
            &format!("API call: {method} {endpoint}"),
            Some(details),
            user_id,
            None,
        );
    }

    /// Logs a content-generation event.
    ///
    /// The detail payload `{topic, template, content_count, success,
    /// error?}` is part of the external contract.
    pub fn log_content_generation(
        &self,
        topic: &str,
        template: &str,
        content_count: u64,
        success: bool,
        error: Option<&str>,
    ) {
        let level = if success { LogLevel::Info } else { LogLevel::Error };

        let mut details = HashMap::from([
            ("topic".to_string(), serde_json::json!(topic)),
            ("template".to_string(), serde_json::json!(template)),
            ("content_count".to_string(), serde_json::json!(content_count)),
            ("success".to_string(), serde_json::json!(success)),
        ]);
        if let Some(error) = error {
            details.insert("error".to_string(), serde_json::json!(error));
        }

        self.log(
            level,
            "content_generator",
            &format!("Content generation: {topic} ({template})"),
            Some(details),
            None,
            None,
        );
    }

    /// Logs a publishing event.
    ///
    /// The detail payload `{video_path, account, success, video_id?,
    /// error?}` is part of the external contract.
    pub fn log_publishing_event(
        &self,
        video_path: &str,
        account: &str,
        success: bool,
        video_id: Option<&str>,
        error: Option<&str>,
    ) {
        let level = if success { LogLevel::Info } else { LogLevel::Error };

        let mut details = HashMap::from([
            ("video_path".to_string(), serde_json::json!(video_path)),
            ("account".to_string(), serde_json::json!(account)),
            ("success".to_string(), serde_json::json!(success)),
        ]);
        if let Some(video_id) = video_id {
            details.insert("video_id".to_string(), serde_json::json!(video_id));
        }
        if let Some(error) = error {
            details.insert("error".to_string(), serde_json::json!(error));
        }

        self.log(
            level,
            "publisher",
            &format!("Publishing: {video_path} to {account}"),
            Some(details),
            None,
            None,
        );
    }

    /// Logs a generic system event at info level.
    pub fn log_system_event(
        &self,
        event_type: &str,
        message: &str,
        details: Option<HashMap<String, serde_json::Value>>,
    ) {
        let mut details = details.unwrap_or_default();
        details.insert("event_type".to_string(), serde_json::json!(event_type));
        self.log(LogLevel::Info, "system", message, Some(details), None, None);
    }

    /// Searches the active log file.
    ///
    /// Scans only the currently-active file line by line, oldest first;
    /// rotated backups are deliberately out of scope. Malformed lines are
    /// skipped. Filters: exact level match, case-insensitive substring
    /// match on the message (the empty query matches everything) and an
    /// inclusive timestamp range.
    ///
    /// # Errors
    ///
    /// Returns an error if the active file exists but cannot be read. A
    /// missing file yields an empty result.
    pub fn search(
        &self,
        query: &str,
        level: Option<LogLevel>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<LogRecord>, LoggerError> {
        let path = self.config.active_log_file();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let query = query.to_lowercase();
        let file = std::fs::File::open(&path)?;
        let reader = std::io::BufReader::new(file);

        let mut matches = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let Ok(record) = serde_json::from_str::<LogRecord>(&line) else {
                // Corrupted line; keep scanning.
                continue;
            };

            if let Some(level) = level {
                if record.level != level {
                    continue;
                }
            }
            if let Some(start) = start {
                if record.timestamp < start {
                    continue;
                }
            }
            if let Some(end) = end {
                if record.timestamp > end {
                    continue;
                }
            }
            if !record.message.to_lowercase().contains(&query) {
                continue;
            }
            matches.push(record);
        }
        Ok(matches)
    }

    /// Deletes log files older than `days_to_keep` days.
    ///
    /// Sweeps every `*.log*` file in the log directory, active or backup,
    /// whose last-modified time is older than the horizon. Per-file
    /// failures are logged and do not abort the sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory itself cannot be listed.
    pub fn cleanup_old_logs(&self, days_to_keep: u32) -> Result<usize, LoggerError> {
        let horizon = std::time::Duration::from_secs(u64::from(days_to_keep) * 24 * 60 * 60);
        let cutoff = std::time::SystemTime::now()
            .checked_sub(horizon)
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

        let mut cleaned = 0;
        for entry in std::fs::read_dir(&self.config.log_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.contains(".log") {
                continue;
            }

            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if modified >= cutoff {
                continue;
            }

            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    cleaned += 1;
                    self.log_system_event(
                        "cleanup",
                        &format!("Deleted old log file: {name}"),
                        None,
                    );
                }
                Err(error) => {
                    self.log(
                        LogLevel::Error,
                        "system",
                        &format!("Failed to delete log file: {name}"),
                        Some(HashMap::from([(
                            "error".to_string(),
                            serde_json::json!(error.to_string()),
                        )])),
                        None,
                        None,
                    );
                }
            }
        }

        if cleaned > 0 {
            self.log_system_event(
                "cleanup",
                &format!("Cleaned up {cleaned} old log files"),
                None,
            );
        }
        Ok(cleaned)
    }

    /// Returns a statistics snapshot of the pipeline and log directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory cannot be listed.
    pub fn stats(&self) -> Result<LogStats, LoggerError> {
        let mut log_files = Vec::new();
        for entry in std::fs::read_dir(&self.config.log_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.contains(".log") {
                continue;
            }
            let metadata = entry.metadata()?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            log_files.push(LogFileInfo {
                name,
                size_bytes: metadata.len(),
                modified,
            });
        }
        log_files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(LogStats {
            log_directory: self.config.log_dir.display().to_string(),
            queued_records: self.tx.max_capacity() - self.tx.capacity(),
            dropped_records: self.dropped.load(Ordering::Relaxed),
            log_files,
        })
    }

    /// Number of records dropped because the queue was full.
    #[must_use]
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The logging configuration this instance was started with.
    #[must_use]
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Stops the delivery worker with a bounded join.
    ///
    /// Buffered records are delivered best-effort; records still queued
    /// after the timeout are discarded. Idempotent: later calls are
    /// no-ops, and records enqueued after shutdown count as dropped.
    pub async fn shutdown(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn test_config(dir: &std::path::Path) -> LoggingConfig {
        LoggingConfig {
            log_dir: dir.to_path_buf(),
            max_log_size: 1024 * 1024,
            backup_count: 3,
            queue_capacity: 100,
            enable_file: true,
            enable_console: false,
        }
    }

    async fn flushed_logger(config: LoggingConfig) -> SystemLogger {
        SystemLogger::start(config).unwrap()
    }

    #[tokio::test]
    async fn test_log_and_flush_to_file() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;

        logger.log(LogLevel::Info, "api", "first", None, None, None);
        logger.log(LogLevel::Error, "api", "second", None, None, None);
        logger.shutdown().await;

        let content = std::fs::read_to_string(dir.path().join("system.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: LogRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.message, "first");
        assert_eq!(first.level, LogLevel::Info);
    }

    #[tokio::test]
    async fn test_overflow_drops_and_counts() {
        let dir = tempdir().unwrap();
        let config = LoggingConfig {
            queue_capacity: 4,
            enable_file: false,
            enable_console: false,
            ..test_config(dir.path())
        };
        // No sinks and an immediate shutdown: the worker is gone, so
        // everything past the buffered capacity is dropped.
        let logger = flushed_logger(config).await;
        logger.shutdown().await;

        for i in 0..10 {
            logger.log(LogLevel::Info, "test", &format!("m{i}"), None, None, None);
        }

        assert!(logger.dropped_records() >= 6);
    }

    #[tokio::test]
    async fn test_typed_api_call_event_payload() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;

        logger.log_api_call("/upload", "POST", 201, 153.2, Some("user-1"));
        logger.shutdown().await;

        let content = std::fs::read_to_string(dir.path().join("system.log")).unwrap();
        let record: LogRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();

        assert_eq!(record.module, "api");
        assert_eq!(record.message, "API call: POST /upload");
        assert_eq!(record.user_id, Some("user-1".to_string()));
        let details = record.details.unwrap();
        assert_eq!(details["endpoint"], serde_json::json!("/upload"));
        assert_eq!(details["method"], serde_json::json!("POST"));
        assert_eq!(details["status_code"], serde_json::json!(201));
        assert_eq!(details["response_time_ms"], serde_json::json!(153.2));
    }

    #[tokio::test]
    async fn test_typed_content_generation_failure_payload() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;

        logger.log_content_generation("space facts", "shorts-v2", 0, false, Some("quota exceeded"));
        logger.shutdown().await;

        let content = std::fs::read_to_string(dir.path().join("system.log")).unwrap();
        let record: LogRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();

        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.module, "content_generator");
        let details = record.details.unwrap();
        assert_eq!(details["success"], serde_json::json!(false));
        assert_eq!(details["error"], serde_json::json!("quota exceeded"));
    }

    #[tokio::test]
    async fn test_typed_publishing_event_omits_absent_optionals() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;

        logger.log_publishing_event("out/clip.mp4", "main-account", true, Some("v-42"), None);
        logger.shutdown().await;

        let content = std::fs::read_to_string(dir.path().join("system.log")).unwrap();
        let record: LogRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();

        let details = record.details.unwrap();
        assert_eq!(details["video_id"], serde_json::json!("v-42"));
        assert!(!details.contains_key("error"));
    }

    #[tokio::test]
    async fn test_search_filters_and_skips_corrupt_lines() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;

        logger.log(LogLevel::Info, "api", "Request accepted", None, None, None);
        logger.log(LogLevel::Error, "api", "Request failed", None, None, None);
        logger.shutdown().await;

        // Corrupt one line in place.
        let path = dir.path().join("system.log");
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not valid json\n");
        std::fs::write(&path, content).unwrap();

        // Empty query, no level: every well-formed entry, file order.
        let all = logger.search("", None, None, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "Request accepted");

        // Level filter.
        let errors = logger.search("", Some(LogLevel::Error), None, None).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Request failed");

        // Case-insensitive substring.
        let matched = logger.search("FAILED", None, None, None).unwrap();
        assert_eq!(matched.len(), 1);
    }

    #[tokio::test]
    async fn test_search_timestamp_bounds_inclusive() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;

        let base = Utc::now();
        for offset in [0, 60, 120] {
            logger.enqueue(
                LogRecord::new(LogLevel::Info, "t", format!("at+{offset}"))
                    .with_timestamp(base + Duration::seconds(offset)),
            );
        }
        logger.shutdown().await;

        let within = logger
            .search(
                "",
                None,
                Some(base + Duration::seconds(60)),
                Some(base + Duration::seconds(120)),
            )
            .unwrap();

        assert_eq!(within.len(), 2);
        assert_eq!(within[0].message, "at+60");
        assert_eq!(within[1].message, "at+120");
    }

    #[tokio::test]
    async fn test_search_ignores_rotated_backups() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;
        logger.log(LogLevel::Info, "t", "active entry", None, None, None);
        logger.shutdown().await;

        // Plant a rotated backup holding an otherwise matching record.
        let backup = serde_json::to_string(&LogRecord::new(LogLevel::Info, "t", "old entry")).unwrap();
        std::fs::write(dir.path().join("system.log.1"), format!("{backup}\n")).unwrap();

        let results = logger.search("entry", None, None, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "active entry");
    }

    #[tokio::test]
    async fn test_cleanup_deletes_only_stale_files() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;

        let stale = dir.path().join("system.log.2");
        std::fs::write(&stale, "old\n").unwrap();
        // Push the mtime 40 days into the past.
        let old = std::time::SystemTime::now() - std::time::Duration::from_secs(40 * 24 * 60 * 60);
        let file = std::fs::File::options().write(true).open(&stale).unwrap();
        file.set_modified(old).unwrap();
        drop(file);

        let fresh = dir.path().join("system.log.1");
        std::fs::write(&fresh, "recent\n").unwrap();

        let cleaned = logger.cleanup_old_logs(30).unwrap();
        logger.shutdown().await;

        assert_eq!(cleaned, 1);
        assert!(!stale.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_stats_lists_log_files() {
        let dir = tempdir().unwrap();
        let logger = flushed_logger(test_config(dir.path())).await;
        logger.log(LogLevel::Info, "t", "entry", None, None, None);
        logger.shutdown().await;

        let stats = logger.stats().unwrap();

        assert_eq!(stats.log_directory, dir.path().display().to_string());
        assert_eq!(stats.dropped_records, 0);
        assert_eq!(stats.log_files.len(), 1);
        assert_eq!(stats.log_files[0].name, "system.log");
        assert!(stats.log_files[0].size_bytes > 0);
    }
}
