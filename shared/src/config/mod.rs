//! Observability pipeline configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults; binaries call `dotenvy` first so a local `.env` file works.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable is set but does not parse.
    #[error("Invalid value for {var}: {source}")]
    InvalidNumber {
        /// The offending environment variable.
        var: &'static str,
        /// The underlying parse error.
        source: std::num::ParseIntError,
    },
}

fn numeric_var<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    std::env::var(var)
        .ok()
        .map(|v| v.parse::<T>())
        .transpose()
        .map_err(|source| ConfigError::InvalidNumber { var, source })
}

/// Configuration of the logging pipeline.
///
/// Environment variables:
/// - `CLIPWATCH_LOG_DIR`: directory for log files (default: "logs")
/// - `CLIPWATCH_MAX_LOG_SIZE`: rotation threshold in bytes (default: 10 MiB)
/// - `CLIPWATCH_LOG_BACKUP_COUNT`: rotated backups to keep (default: 5)
/// - `CLIPWATCH_LOG_QUEUE_CAPACITY`: bounded queue capacity (default: 1000)
/// - `CLIPWATCH_LOG_FILE`: enable the file sink (default: true)
/// - `CLIPWATCH_LOG_CONSOLE`: enable the console sink (default: true)
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory holding the active log file and its rotated backups.
    pub log_dir: PathBuf,
    /// Size in bytes beyond which the active file is rotated.
    pub max_log_size: u64,
    /// Number of rotated backup files retained.
    pub backup_count: usize,
    /// Capacity of the bounded record queue.
    pub queue_capacity: usize,
    /// Whether the JSON-lines file sink is registered.
    pub enable_file: bool,
    /// Whether the colored console sink is registered.
    pub enable_console: bool,
}

impl LoggingConfig {
    /// Loads the logging configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_dir = std::env::var("CLIPWATCH_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        let max_log_size =
            numeric_var("CLIPWATCH_MAX_LOG_SIZE")?.unwrap_or(10 * 1024 * 1024);
        let backup_count = numeric_var("CLIPWATCH_LOG_BACKUP_COUNT")?.unwrap_or(5);
        let queue_capacity = numeric_var("CLIPWATCH_LOG_QUEUE_CAPACITY")?.unwrap_or(1000);

        let enable_file = std::env::var("CLIPWATCH_LOG_FILE")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        let enable_console = std::env::var("CLIPWATCH_LOG_CONSOLE")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Ok(Self {
            log_dir,
            max_log_size,
            backup_count,
            queue_capacity,
            enable_file,
            enable_console,
        })
    }

    /// Path of the active log file.
    #[must_use]
    pub fn active_log_file(&self) -> PathBuf {
        self.log_dir.join("system.log")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            max_log_size: 10 * 1024 * 1024,
            backup_count: 5,
            queue_capacity: 1000,
            enable_file: true,
            enable_console: true,
        }
    }
}

/// Configuration of the metrics collector and time-series store.
///
/// Environment variables:
/// - `CLIPWATCH_METRICS_DB`: SQLite database path (default: "logs/metrics.db")
/// - `CLIPWATCH_COLLECT_INTERVAL`: sampling interval in seconds (default: 60)
/// - `CLIPWATCH_CONTENT_DIR`: directory scanned for generated videos (default: "output")
/// - `CLIPWATCH_CREDENTIALS_FILE`: API credentials file whose entries are counted
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Path of the SQLite time-series database.
    pub db_path: PathBuf,
    /// Seconds between sampling ticks.
    pub interval_secs: u64,
    /// Directory containing generated video artifacts.
    pub content_dir: PathBuf,
    /// File whose non-empty lines are counted as configured credentials.
    pub credentials_file: PathBuf,
    /// Log directory measured by the log-size probe.
    pub log_dir: PathBuf,
}

impl CollectorConfig {
    /// Loads the collector configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `CLIPWATCH_COLLECT_INTERVAL` is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var("CLIPWATCH_METRICS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs/metrics.db"));

        let interval_secs = numeric_var("CLIPWATCH_COLLECT_INTERVAL")?.unwrap_or(60);

        let content_dir = std::env::var("CLIPWATCH_CONTENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));

        let credentials_file = std::env::var("CLIPWATCH_CREDENTIALS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("secrets/tiktok_keys.env"));

        let log_dir = std::env::var("CLIPWATCH_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        Ok(Self {
            db_path,
            interval_secs,
            content_dir,
            credentials_file,
            log_dir,
        })
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("logs/metrics.db"),
            interval_secs: 60,
            content_dir: PathBuf::from("output"),
            credentials_file: PathBuf::from("secrets/tiktok_keys.env"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();

        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.max_log_size, 10 * 1024 * 1024);
        assert_eq!(config.backup_count, 5);
        assert_eq!(config.queue_capacity, 1000);
        assert!(config.enable_file);
        assert!(config.enable_console);
    }

    #[test]
    fn test_active_log_file_path() {
        let config = LoggingConfig {
            log_dir: PathBuf::from("/var/log/clipwatch"),
            ..LoggingConfig::default()
        };

        assert_eq!(
            config.active_log_file(),
            PathBuf::from("/var/log/clipwatch/system.log")
        );
    }

    #[test]
    fn test_from_env_rejects_bad_number() {
        std::env::set_var("CLIPWATCH_MAX_LOG_SIZE", "ten-megabytes");
        let result = LoggingConfig::from_env();
        std::env::remove_var("CLIPWATCH_MAX_LOG_SIZE");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                var: "CLIPWATCH_MAX_LOG_SIZE",
                ..
            })
        ));
    }

    #[test]
    fn test_collector_config_defaults() {
        let config = CollectorConfig::default();

        assert_eq!(config.db_path, PathBuf::from("logs/metrics.db"));
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.content_dir, PathBuf::from("output"));
    }
}
