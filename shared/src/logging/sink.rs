//! Log sinks.
//!
//! A sink is a destination that durably stores or displays log records.
//! The worker fans each dequeued record out to every registered sink in
//! registration order.

use crate::models::{LogLevel, LogRecord};
use std::fs::{File, OpenOptions};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur while writing to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A destination for log records.
///
/// Implementations must be thread-safe; each record is delivered at most
/// once per sink and sinks only ever read the record.
pub trait LogSink: Send + Sync {
    /// Short sink name used in failure diagnostics.
    fn name(&self) -> &'static str;

    /// Writes one record to the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted or displayed.
    /// A failing sink never aborts delivery to the remaining sinks.
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;
}

struct ActiveFile {
    file: File,
    size: u64,
}

/// JSON-lines file sink with size-based rotation.
///
/// Appends one JSON object per line to the active file. When the active
/// file grows past `max_size` it is renamed into the cyclic backup
/// sequence `<path>.1` .. `<path>.N` and a fresh active file is opened;
/// the oldest backup beyond `backup_count` is deleted. At most
/// `backup_count + 1` files are ever retained.
pub struct FileSink {
    path: PathBuf,
    max_size: u64,
    backup_count: usize,
    inner: Mutex<ActiveFile>,
}

impl FileSink {
    /// Opens (or creates) the active file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its size queried.
    pub fn new(path: PathBuf, max_size: u64, backup_count: usize) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            max_size,
            backup_count,
            inner: Mutex::new(ActiveFile { file, size }),
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Rotates the active file into the backup sequence.
    ///
    /// Cascade-renames `<path>.N-1` to `<path>.N`, drops the entry past
    /// `backup_count`, moves the active file to `<path>.1` and reopens a
    /// fresh active file.
    fn rotate(&self, inner: &mut ActiveFile) -> Result<(), SinkError> {
        if self.backup_count == 0 {
            std::fs::remove_file(&self.path)?;
        } else {
            let oldest = self.backup_path(self.backup_count);
            if oldest.exists() {
                std::fs::remove_file(&oldest)?;
            }
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    std::fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1))?;
        }

        inner.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        inner.size = 0;
        Ok(())
    }
}

impl LogSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;

        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.file.write_all(line.as_bytes())?;
        inner.file.write_all(b"\n")?;
        inner.size += line.len() as u64 + 1;

        if inner.size > self.max_size {
            self.rotate(&mut inner)?;
        }
        Ok(())
    }
}

/// Console sink rendering one line per record.
///
/// The level token is colored for interactive terminals only; redirected
/// output contains no escape codes, so parsed content is unaffected.
pub struct ConsoleSink {
    colorize: bool,
}

impl ConsoleSink {
    /// Creates a console sink, enabling color iff stdout is a terminal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            colorize: std::io::stdout().is_terminal(),
        }
    }

    /// Creates a console sink with color forced on or off.
    #[must_use]
    pub fn with_color(colorize: bool) -> Self {
        Self { colorize }
    }

    fn level_token(&self, level: LogLevel) -> String {
        let name = level.to_string().to_uppercase();
        if !self.colorize {
            return name;
        }
        let color = match level {
            LogLevel::Debug => "\x1b[36m",    // cyan
            LogLevel::Info => "\x1b[32m",     // green
            LogLevel::Warning => "\x1b[33m",  // yellow
            LogLevel::Error => "\x1b[31m",    // red
            LogLevel::Critical => "\x1b[35m", // magenta
        };
        format!("{color}{name}\x1b[0m")
    }

    fn format_line(&self, record: &LogRecord) -> String {
        format!(
            "{} [{}] {}: {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level_token(record.level),
            record.module,
            record.message
        )
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = self.format_line(record);
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }
}
