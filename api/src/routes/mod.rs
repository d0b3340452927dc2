//! API route definitions.
//!
//! This module organizes all HTTP routes for the Clipwatch dashboard API.

mod health;
mod logs;
mod metrics;
mod status;

pub use health::health_routes;
pub use logs::logs_routes;
pub use metrics::metrics_routes;
pub use status::status_routes;
