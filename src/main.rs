//! Browser conformance CLI
//!
//! Runs per-browser expectation suites against an emulation engine and
//! reports every (test, profile, mode) mismatch with a member diff.

use clap::Parser;
use conformance::common::config::Config;
use conformance::common::logging;
use conformance::report::{EXIT_CONFIG, EXIT_FAILED};
use conformance::{cli, commands::Commands};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conformance", about = "Per-browser conformance checks for browser emulators")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write a detailed log file to the data directory
    #[arg(long, global = true)]
    log_file: bool,

    /// Debug-level logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Held until exit so buffered log lines are flushed
    let _log_guard = if cli.log_file {
        logging::init_with_file(cli.debug).map(|(_, guard)| guard)
    } else {
        logging::init_cli(cli.debug);
        None
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            let code = if e.is_configuration() {
                EXIT_CONFIG
            } else {
                EXIT_FAILED
            };
            std::process::exit(code);
        }
    }
}
