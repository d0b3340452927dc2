//! Clipwatch Shared Library
//!
//! This crate contains the observability pipeline shared across the
//! Clipwatch services: the structured logging pipeline, the metric
//! store, the collector and the alert manager.
//!
//! # Modules
//!
//! - [`models`] - Data models for logs, metrics and alerts
//! - [`config`] - Environment-driven configuration
//! - [`logging`] - Bounded-queue logging pipeline and sinks
//! - [`storage`] - SQLite metric time-series store
//! - [`monitoring`] - Periodic collection and threshold alerting
//!
//! # Example
//!
//! ```
//! use shared::models::{LogLevel, LogRecord};
//!
//! let record = LogRecord::new(LogLevel::Info, "api", "User logged in")
//!     .with_detail("endpoint", serde_json::json!("/login"))
//!     .with_user_id("12345");
//!
//! assert!(record.validate_record().is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod logging;
pub mod models;
pub mod monitoring;
pub mod storage;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
