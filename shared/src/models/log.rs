//! Log data model.
//!
//! Defines the core `LogRecord` structure that flows through the logging
//! pipeline and is persisted as one JSON object per line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

/// Log severity level.
///
/// Mirrors the level names used throughout the automation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational messages.
    Info,
    /// Warning conditions.
    Warning,
    /// Error conditions.
    Error,
    /// Critical conditions.
    Critical,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

/// Error returned when parsing an unknown level name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown log level: '{0}'")]
pub struct ParseLogLevelError(String);

impl std::str::FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(ParseLogLevelError(other.to_string())),
        }
    }
}

/// A structured log record representing a single log event.
///
/// Records are immutable once constructed. The serialized form is the
/// external contract of the file sink: one JSON object per line with
/// every field present (`null` for absent optionals).
///
/// # Example
///
/// ```
/// use shared::models::{LogLevel, LogRecord};
///
/// let record = LogRecord::new(LogLevel::Info, "publisher", "Upload finished")
///     .with_detail("video_id", "v-123")
///     .with_user_id("creator-7");
///
/// assert!(record.validate_record().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogRecord {
    /// Wall-clock time at which the record was created.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the record.
    #[serde(default)]
    pub level: LogLevel,

    /// Name of the module or subsystem that produced the record.
    #[validate(length(min = 1, message = "Module name cannot be empty"))]
    pub module: String,

    /// The log message content.
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,

    /// Additional structured details.
    #[serde(default)]
    pub details: Option<HashMap<String, serde_json::Value>>,

    /// Optional user the event is attributed to.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Optional session the event belongs to.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Errors that can occur during log record validation.
#[derive(Debug, Error)]
pub enum LogValidationError {
    /// The log message is empty.
    #[error("Log message cannot be empty")]
    EmptyMessage,

    /// The module name is empty.
    #[error("Module name cannot be empty")]
    EmptyModule,

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl LogRecord {
    /// Creates a new log record with the current timestamp.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::models::{LogLevel, LogRecord};
    ///
    /// let record = LogRecord::new(LogLevel::Warning, "collector", "Probe skipped");
    /// assert_eq!(record.level, LogLevel::Warning);
    /// assert_eq!(record.module, "collector");
    /// ```
    #[must_use]
    pub fn new(level: LogLevel, module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            module: module.into(),
            message: message.into(),
            details: None,
            user_id: None,
            session_id: None,
        }
    }

    /// Adds a detail entry to the record.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Replaces the detail map wholesale.
    #[must_use]
    pub fn with_details(mut self, details: HashMap<String, serde_json::Value>) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the user the event is attributed to.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the session the event belongs to.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the timestamp explicitly.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Validates the log record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The message is empty
    /// - The module name is empty
    pub fn validate_record(&self) -> Result<(), LogValidationError> {
        if self.message.is_empty() {
            return Err(LogValidationError::EmptyMessage);
        }
        if self.module.is_empty() {
            return Err(LogValidationError::EmptyModule);
        }
        self.validate()?;
        Ok(())
    }
}
