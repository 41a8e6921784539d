//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `smoketest` library that handles:
//! - Command-line argument parsing
//! - Settings file loading
//! - Logger initialization
//! - Ctrl-C handling and the process exit code
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use smoketest::initialization::init_logger_with;
use smoketest::{run_smoketest, Opt, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let settings = match Settings::load(&opt.settings) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("smoketest error: {e}");
            process::exit(1);
        }
    };
    let options = opt.into_run_options(&settings);

    let shutdown = CancellationToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nWaiting for workers to stop...");
            interrupt.cancel();
        }
    });

    match run_smoketest(options, &settings, &shutdown).await {
        Ok(report) if report.cancelled => {
            eprintln!("Smoketest cancelled by user.");
            process::exit(1);
        }
        Ok(report) => process::exit(if report.success { 0 } else { 1 }),
        Err(e) => {
            eprintln!("smoketest error: {:#}", e);
            process::exit(1);
        }
    }
}
