//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `gateway_conformance` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C cancellation
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use gateway_conformance::initialization::init_logger_with;
use gateway_conformance::{cancel_on_ctrl_c, print_report, run_conformance, shutdown_gracefully, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let config = Config::parse();

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let cancel = CancellationToken::new();
    let signal_task = cancel_on_ctrl_c(cancel.clone());

    let result = run_conformance(&config, cancel.clone()).await;
    shutdown_gracefully(cancel, signal_task).await;

    match result {
        Ok(reports) => {
            print_report(&reports, config.json).context("Failed to print report")?;
            if !reports.iter().all(|r| r.all_passed()) {
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("gateway_conformance error: {:#}", e);
            process::exit(2);
        }
    }
}
