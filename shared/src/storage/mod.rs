//! Persistent storage for metric time series.

pub mod metric_store;

pub use metric_store::{SqliteMetricStore, StoreError};
