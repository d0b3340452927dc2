//! Asynchronous structured logging pipeline.
//!
//! Producers enqueue [`crate::models::LogRecord`]s on a bounded queue; a
//! single background worker drains the queue and fans each record out to
//! the registered sinks. The pipeline never blocks a producer: overflow
//! is dropped and counted.

pub mod logger;
pub mod sink;
pub mod worker;

pub use logger::{LogFileInfo, LogStats, LoggerError, SystemLogger};
pub use sink::{ConsoleSink, FileSink, LogSink, SinkError};
pub use worker::{spawn_worker, WorkerHandle, SHUTDOWN_TIMEOUT};
