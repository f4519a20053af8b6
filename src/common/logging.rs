//! Logging and tracing configuration
//!
//! Terminal logging goes to stderr so stdout stays clean for reports (and for
//! `--json`). A run can additionally log to a file in the data directory.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use super::paths;

/// Log file name inside the log directory
const LOG_FILE: &str = "conformance.log";

fn cli_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("conformance=debug,warn")
        } else {
            EnvFilter::new("conformance=info,warn")
        }
    })
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate (DEBUG with `--verbose`), WARN for
/// dependencies.
pub fn init_cli(verbose: bool) {
    tracing_subscriber::registry()
        .with(cli_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing with both stderr and a log file
///
/// The file layer records everything down to TRACE for this crate, which
/// includes per-unit state transitions. The returned guard must be held for
/// the lifetime of the process so buffered lines are flushed.
///
/// Falls back to stderr-only logging when the log directory is unavailable.
pub fn init_with_file(verbose: bool) -> Option<(PathBuf, WorkerGuard)> {
    let log_dir = match paths::ensure_log_dir() {
        Ok(Some(dir)) => dir,
        Ok(None) => {
            init_cli(verbose);
            return None;
        }
        Err(e) => {
            eprintln!("Warning: Could not create log directory: {}", e);
            init_cli(verbose);
            return None;
        }
    };

    let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new("conformance=trace,info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(cli_filter(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Some((log_dir.join(LOG_FILE), guard))
}

/// Get the path to the log file
pub fn log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join(LOG_FILE))
}
