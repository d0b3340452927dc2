//! Asynchronous log delivery worker.
//!
//! A single background task drains the bounded record queue and fans each
//! record out to every registered sink. Producers never block: the queue
//! is a fixed-capacity channel and overflow is dropped at the sender.

use crate::logging::sink::LogSink;
use crate::models::LogRecord;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Bound on how long shutdown waits for the worker to finish.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the spawned delivery worker.
///
/// Dropping the handle without calling [`WorkerHandle::shutdown`] leaves
/// the task running until every sender is dropped.
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signals the worker to stop and waits up to [`SHUTDOWN_TIMEOUT`].
    ///
    /// Records still buffered when the signal arrives are delivered
    /// best-effort; records remaining after the timeout are discarded.
    pub async fn shutdown(self) {
        // Receiver may already be gone if the worker exited on its own.
        let _ = self.shutdown_tx.send(true);

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.join)
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                "Log worker did not stop in time; remaining records discarded"
            );
        }
    }
}

/// Spawns the single consumer task draining `rx` into `sinks`.
///
/// Sinks receive each record in registration order. A sink failure is
/// reported on the fallback channel (`tracing`) and never aborts delivery
/// to the remaining sinks or the worker loop itself.
#[must_use]
pub fn spawn_worker(mut rx: mpsc::Receiver<LogRecord>, sinks: Vec<Box<dyn LogSink>>) -> WorkerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(record) => deliver(&sinks, &record),
                    // All senders dropped.
                    None => break,
                },
                _ = shutdown_rx.changed() => {
                    // Drain whatever is already buffered, then stop.
                    while let Ok(record) = rx.try_recv() {
                        deliver(&sinks, &record);
                    }
                    break;
                }
            }
        }
    });

    WorkerHandle { shutdown_tx, join }
}

fn deliver(sinks: &[Box<dyn LogSink>], record: &LogRecord) {
    for sink in sinks {
        if let Err(error) = sink.write(record) {
            tracing::error!(sink = sink.name(), %error, "Log sink write failed");
        }
    }
}
