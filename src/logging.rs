//! Tracing setup for the command-line tool.
//!
//! Two layers are installed: a terse one on stderr (warnings by default,
//! debug with `--verbose`, or whatever `RUST_LOG` says) and a timestamped
//! audit log appended to a file, which records every planning and move
//! decision.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Installs the global subscriber. Keep the returned guard alive for the
/// whole run so buffered log lines are flushed on exit.
pub fn init_logging(log_path: &Path, verbose: bool) -> Option<WorkerGuard> {
    let console_default = if verbose { "debug" } else { "warn" };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_default));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let (file_layer, guard) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
                .with_filter(LevelFilter::INFO);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!(
                "Warning: could not open log file {}: {}",
                log_path.display(),
                e
            );
            (None, None)
        }
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: could not install logging: {}", e);
    }

    guard
}
