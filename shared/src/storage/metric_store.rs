//! SQLite-backed metric time series.
//!
//! One append-only table holds every sample. Timestamps are stored as
//! fixed-precision RFC 3339 text so lexicographic comparison is also
//! chronological comparison, which keeps range filters plain string
//! predicates. WAL mode lets the dashboard read while the collector
//! writes.

use crate::models::MetricSample;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised by the metric store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened or queried.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded into a sample.
    #[error("Corrupt stored sample: {0}")]
    Decode(String),

    /// The database parent directory could not be created.
    #[error("Failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    metric_name TEXT NOT NULL,
    metric_value REAL NOT NULL,
    unit TEXT NOT NULL DEFAULT '',
    tags TEXT
);
CREATE INDEX IF NOT EXISTS idx_metric_name ON metrics (metric_name);
CREATE INDEX IF NOT EXISTS idx_timestamp ON metrics (timestamp);
";

fn format_timestamp(ts: DateTime<Utc>) -> String {
    // Fixed precision keeps the text sortable.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(sqlx::FromRow)]
struct MetricRow {
    timestamp: String,
    metric_name: String,
    metric_value: f64,
    unit: String,
    tags: Option<String>,
}

impl MetricRow {
    fn into_sample(self) -> Result<MetricSample, StoreError> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| StoreError::Decode(format!("bad timestamp {:?}: {e}", self.timestamp)))?
            .with_timezone(&Utc);

        let tags: Option<HashMap<String, String>> = match self.tags {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Decode(format!("bad tags: {e}")))?,
            ),
            None => None,
        };

        Ok(MetricSample {
            timestamp,
            metric_name: self.metric_name,
            metric_value: self.metric_value,
            unit: self.unit,
            tags,
        })
    }
}

/// Persistent metric time-series store.
///
/// Cloning is cheap; every clone shares the same connection pool.
#[derive(Clone)]
pub struct SqliteMetricStore {
    pool: SqlitePool,
}

impl SqliteMetricStore {
    /// Opens (or creates) the database at `path` and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened or the schema cannot be applied.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        Self::connect(options).await
    }

    /// Opens an in-memory database, useful as a test fixture.
    ///
    /// The pool is pinned to a single connection that never expires; an
    /// in-memory database lives and dies with its connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await?;
        Self::init(pool).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        Self::init(SqlitePool::connect_with(options).await?).await
    }

    async fn init(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Inserts a batch of samples in a single transaction.
    ///
    /// All samples land or none do, so a tick never persists partially.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; the database is left
    /// unchanged in that case.
    pub async fn insert_batch(&self, samples: &[MetricSample]) -> Result<(), StoreError> {
        if samples.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for sample in samples {
            let tags = sample
                .tags
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| StoreError::Decode(format!("unencodable tags: {e}")))?;

            sqlx::query(
                "INSERT INTO metrics (timestamp, metric_name, metric_value, unit, tags)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(format_timestamp(sample.timestamp))
            .bind(&sample.metric_name)
            .bind(sample.metric_value)
            .bind(&sample.unit)
            .bind(tags)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Returns samples of `metric_name` from the last `hours` hours,
    /// most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is corrupt.
    pub async fn query(
        &self,
        metric_name: &str,
        hours: u32,
    ) -> Result<Vec<MetricSample>, StoreError> {
        let cutoff = Utc::now() - chrono::Duration::hours(i64::from(hours));

        let rows: Vec<MetricRow> = sqlx::query_as(
            "SELECT timestamp, metric_name, metric_value, unit, tags
             FROM metrics
             WHERE metric_name = ? AND timestamp >= ?
             ORDER BY timestamp DESC",
        )
        .bind(metric_name)
        .bind(format_timestamp(cutoff))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MetricRow::into_sample).collect()
    }

    /// Returns the most recent sample of every metric.
    ///
    /// Ties on timestamp resolve to the later insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is corrupt.
    pub async fn latest(&self) -> Result<Vec<MetricSample>, StoreError> {
        let rows: Vec<MetricRow> = sqlx::query_as(
            "SELECT timestamp, metric_name, metric_value, unit, tags
             FROM metrics
             WHERE id IN (SELECT MAX(id) FROM metrics GROUP BY metric_name)
             ORDER BY metric_name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MetricRow::into_sample).collect()
    }

    /// Total number of stored samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM metrics")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unsigned_abs())
    }
}
