//! Clipwatch CLI
//!
//! Maintenance command-line interface for the Clipwatch observability
//! pipeline: log statistics, log search and retention cleanup.
//!
//! # Usage
//!
//! ```bash
//! clipwatch --help
//! clipwatch stats
//! clipwatch search "upload failed" --level error
//! clipwatch cleanup 30
//! ```

#![deny(unsafe_code)]

use clap::{Parser, Subcommand};
use shared::config::LoggingConfig;
use shared::logging::SystemLogger;
use shared::models::LogLevel;

/// Clipwatch CLI - Observability pipeline maintenance interface
#[derive(Parser)]
#[command(name = "clipwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show logging pipeline statistics
    Stats,
    /// Search the active log file
    Search {
        /// Case-insensitive substring matched against messages
        query: String,
        /// Restrict matches to one level (debug, info, warning, error, critical)
        #[arg(short, long)]
        level: Option<LogLevel>,
    },
    /// Delete log files older than the given number of days
    Cleanup {
        /// Retention horizon in days
        days: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Maintenance commands write nothing to the pipeline; the console
    // sink stays off so command output is the only stdout.
    let config = LoggingConfig {
        enable_console: false,
        ..LoggingConfig::from_env()?
    };
    let logger = SystemLogger::start(config)?;

    match cli.command {
        Commands::Stats => {
            let stats = logger.stats()?;
            println!("Log directory: {}", stats.log_directory);
            println!("Queued records: {}", stats.queued_records);
            println!("Dropped records: {}", stats.dropped_records);
            println!("Log files:");
            for file in &stats.log_files {
                println!(
                    "  {} ({} bytes, modified {})",
                    file.name,
                    file.size_bytes,
                    file.modified.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        Commands::Search { query, level } => {
            let matches = logger.search(&query, level, None, None)?;
            if matches.is_empty() {
                println!("No matching log records");
            } else {
                println!("{} matching record(s), showing last 10:", matches.len());
                for record in matches.iter().rev().take(10).rev() {
                    println!(
                        "{} [{}] {}: {}",
                        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        record.level.to_string().to_uppercase(),
                        record.module,
                        record.message
                    );
                }
            }
        }
        Commands::Cleanup { days } => {
            let cleaned = logger.cleanup_old_logs(days)?;
            println!("Deleted {cleaned} log file(s) older than {days} day(s)");
        }
    }

    logger.shutdown().await;
    Ok(())
}
