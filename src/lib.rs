//! smoketest library: declarative website smoke tests
//!
//! Reads directives (URLs plus expected outcomes) from list, JSON, YAML or
//! sitemap files, adapts every URL to the target deployment level, fetches
//! them concurrently and reports each assertion's outcome. Failing
//! directives can be re-run in further passes.
//!
//! # Example
//!
//! ```no_run
//! use smoketest::config::{RunOptions, Settings};
//! use smoketest::run_smoketest;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let options = RunOptions {
//!     input_filenames: vec!["checks.yaml".to_string()],
//!     level: "stag".to_string(),
//!     threads: 8,
//!     ..Default::default()
//! };
//! let report = run_smoketest(options, &Settings::default(), &CancellationToken::new()).await?;
//! println!("{} pass(es), success: {}", report.passes, report.success);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod assertion;
pub mod config;
pub mod directive;
pub mod dispatch;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod input;
pub mod pass_runner;
pub mod platform;
pub mod report;
pub mod transform;

pub use config::{LogFormat, LogLevel, Opt, ReportFormat, RunOptions, Settings};
pub use directive::{Directive, DirectiveBuilder, RunContext};
pub use pass_runner::{PassRunner, RunOutcome};
pub use report::Reporter;
pub use transform::{uncachebust, UrlTransformer};

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::initialization::TlsPolicy;
use crate::input::FileParser;
use crate::platform::PlatformRegistry;
use crate::report::build_reporter;

/// Results of a smoketest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Passes started
    pub passes: usize,
    /// Every directive passed within the allowed passes
    pub success: bool,
    /// The run was interrupted by the operator
    pub cancelled: bool,
    /// Directives still failing (or not yet run) when the run ended
    pub remaining_failures: usize,
}

/// Runs a smoketest with the provided options.
///
/// Loads every input file, then runs the directives over `options.threads`
/// workers for up to `options.passes` passes, reporting to stdout or
/// `options.output`. Cancelling `shutdown` lets running directives finish
/// and ends the run as a failure.
///
/// # Errors
///
/// This function will return an error if:
/// - An input file can't be read or holds an invalid directive
/// - The settings file names a platform with invalid headers or an unusable CA bundle
/// - The report output can't be opened or written
pub async fn run_smoketest(
    options: RunOptions,
    settings: &Settings,
    shutdown: &CancellationToken,
) -> Result<RunReport> {
    let tls = TlsPolicy::from_settings(settings).context("Failed to load CA bundle")?;
    let transformer = UrlTransformer::from_settings(settings);
    let registry =
        PlatformRegistry::from_settings(settings).context("Invalid platform configuration")?;

    let directives = {
        let builder = DirectiveBuilder::new(
            &options,
            &transformer,
            &registry,
            settings.request_timeout(),
        );
        FileParser::new(&builder, &options.user_agent, &tls)
            .load(&options.input_filenames)
            .await?
    };
    info!(
        "Loaded {} directive(s) from {}",
        directives.len(),
        options.input_filenames.join(", ")
    );

    let reporter = build_reporter(&options).context("Failed to open report output")?;
    reporter.start(&options);

    let ctx = Arc::new(RunContext {
        dry_run: options.dry_run,
        user_agent: options.user_agent.clone(),
        tls,
        reporter: Arc::clone(&reporter),
    });
    let runner = PassRunner::new(
        ctx,
        options.threads,
        options.passes,
        options.delay_between_passes,
    );
    let outcome = runner.run(directives, shutdown).await;

    reporter.end().context("Failed to write report")?;

    Ok(RunReport {
        passes: outcome.passes_run,
        success: outcome.success,
        cancelled: outcome.cancelled,
        remaining_failures: outcome.remaining.len(),
    })
}
