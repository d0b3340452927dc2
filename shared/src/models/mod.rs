//! Data models for the Clipwatch observability pipeline.
//!
//! This module contains the core data structures for log records, metric
//! samples and alert rules.

pub mod alert;
pub mod log;
pub mod metric;

pub use alert::{ActiveAlert, AlertRule, CompareOp, ParseCompareOpError, Severity};
pub use log::{LogLevel, LogRecord, LogValidationError, ParseLogLevelError};
pub use metric::{MetricSample, MetricValidationError};
