//! Metrics collection and threshold alerting.

pub mod alerts;
pub mod collector;

pub use alerts::{AlertEvent, AlertManager};
pub use collector::MetricsCollector;
