//! Metric data model.
//!
//! Defines the `MetricSample` structure persisted by the time-series store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

/// A single sampled measurement.
///
/// Samples are append-only: once persisted they are never mutated. The
/// store orders them by insertion and serves range queries by name and
/// timestamp.
///
/// # Example
///
/// ```
/// use shared::models::MetricSample;
///
/// let sample = MetricSample::new("system.memory_usage", 72.4, "percent")
///     .with_tag("host", "render-1");
///
/// assert!(sample.validate_sample().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MetricSample {
    /// Time at which the sample was taken.
    pub timestamp: DateTime<Utc>,

    /// Name of the metric (e.g. "`system.load_avg`").
    #[validate(length(min = 1, message = "Metric name cannot be empty"))]
    pub metric_name: String,

    /// The sampled value.
    pub metric_value: f64,

    /// Unit of the value (e.g. "percent", "count", "MB").
    pub unit: String,

    /// Optional dimensions for the sample.
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

/// Errors that can occur during sample validation.
#[derive(Debug, Error)]
pub enum MetricValidationError {
    /// The metric name is empty.
    #[error("Metric name cannot be empty")]
    EmptyName,

    /// The value is not a finite number.
    #[error("Metric value must be finite, got {0}")]
    NonFiniteValue(f64),

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl MetricSample {
    /// Creates a new sample with the current timestamp.
    #[must_use]
    pub fn new(metric_name: impl Into<String>, metric_value: f64, unit: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            metric_name: metric_name.into(),
            metric_value,
            unit: unit.into(),
            tags: None,
        }
    }

    /// Adds a tag to the sample.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the timestamp explicitly.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Validates the sample.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The metric name is empty
    /// - The value is NaN or infinite
    pub fn validate_sample(&self) -> Result<(), MetricValidationError> {
        if self.metric_name.is_empty() {
            return Err(MetricValidationError::EmptyName);
        }
        if !self.metric_value.is_finite() {
            return Err(MetricValidationError::NonFiniteValue(self.metric_value));
        }
        self.validate()?;
        Ok(())
    }
}
