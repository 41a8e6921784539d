//! Configuration types and CLI options.
//!
//! `Opt` is the command-line surface; `RunOptions` is the library-level
//! configuration it resolves into, after defaults from the settings file are
//! applied.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;

use crate::config::constants::{DEFAULT_SETTINGS_FILE, LIVE_LEVEL};
use crate::config::settings::Settings;
use crate::transform::TransformOptions;

/// Logging level for diagnostic output.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Diagnostic log format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: One JSON object per line
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Format of the test-result report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Colored progress and failure details on the terminal
    #[default]
    Shell,
    /// One JSON document written when the run ends
    Json,
}

/// Options for one smoketest run.
///
/// Read-only once the run starts. Serialized as-is into the JSON report's
/// `configuration` section.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    /// Files (or sitemap URLs) to read directives from
    pub input_filenames: Vec<String>,
    /// Replace every URL's scheme
    pub scheme: Option<String>,
    /// Deployment level the URLs are rewritten for
    pub level: String,
    /// Replace every URL's port
    pub port: Option<u16>,
    /// Number of workers per pass
    pub threads: usize,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Append a `_=<millis>` query parameter to every URL
    pub cachebust: bool,
    /// Don't make any requests; every assertion passes
    pub dry_run: bool,
    /// Be less verbose
    pub quiet: bool,
    /// Report verbosity, 0 (failures only) to 4 (bodies and headers)
    pub verbosity: u8,
    /// Write the report to this file instead of stdout
    pub output: Option<PathBuf>,
    /// Report format
    pub format: ReportFormat,
    /// Number of passes; failed directives are re-run on the next pass
    pub passes: usize,
    /// Wait between passes
    #[serde(rename = "delay_between_passes_secs", serialize_with = "serialize_secs")]
    pub delay_between_passes: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input_filenames: Vec::new(),
            scheme: None,
            level: LIVE_LEVEL.to_string(),
            port: None,
            threads: 1,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            cachebust: true,
            dry_run: false,
            quiet: false,
            verbosity: 0,
            output: None,
            format: ReportFormat::Shell,
            passes: 1,
            delay_between_passes: Duration::ZERO,
        }
    }
}

impl RunOptions {
    /// URL transform parameters for URLs read from directive files.
    pub fn transform_options(&self) -> TransformOptions<'_> {
        TransformOptions {
            scheme: self.scheme.as_deref(),
            port: self.port,
            level: Some(self.level.as_str()),
            cachebust: self.cachebust,
        }
    }
}

fn serialize_secs<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Check the live site
/// smoketest checks.yaml
///
/// # Check staging over https with 8 workers, retrying failures twice
/// smoketest checks.yaml --level stag --scheme https -t 8 --passes 3
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "smoketest",
    about = "Checks that a set of pages on a website behave as expected."
)]
pub struct Opt {
    /// Input files: line lists, JSON, YAML, or XML sitemaps (local or http)
    #[arg(required = true)]
    pub input_filenames: Vec<String>,

    /// Transform URLs to use a particular scheme (e.g. http)
    #[arg(short = 's', long)]
    pub scheme: Option<String>,

    /// Transform live-site URLs to target a particular level (e.g. dev, stag)
    #[arg(short = 'l', long, default_value = LIVE_LEVEL)]
    pub level: String,

    /// Transform URLs to target a particular port (e.g. 8080)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Number of workers to use (default from settings file)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Custom User-Agent header (default from settings file)
    #[arg(short = 'u', long)]
    pub user_agent: Option<String>,

    /// Disable cachebusting
    #[arg(long = "no-cachebust", action = ArgAction::SetFalse)]
    pub cachebust: bool,

    /// Don't actually make any requests
    #[arg(long)]
    pub dry_run: bool,

    /// Be less verbose
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Be more verbose; can be used multiple times
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Set verbosity; --verbosity=1 is the same as -v
    #[arg(long)]
    pub verbosity: Option<u8>,

    /// Output report to file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short = 'f', long, value_enum, default_value_t = ReportFormat::Shell)]
    pub format: ReportFormat,

    /// Number of passes
    #[arg(long, default_value_t = 1)]
    pub passes: usize,

    /// Number of seconds to wait between passes
    #[arg(long, default_value_t = 0)]
    pub delay_between_passes: u64,

    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Opt {
    /// Resolves command-line options against the settings file's defaults.
    pub fn into_run_options(self, settings: &Settings) -> RunOptions {
        let threads = self
            .threads
            .unwrap_or_else(|| settings.default_threads_for(&self.level));
        RunOptions {
            input_filenames: self.input_filenames,
            scheme: self.scheme,
            threads,
            user_agent: self.user_agent.unwrap_or_else(|| settings.user_agent()),
            cachebust: self.cachebust,
            dry_run: self.dry_run,
            quiet: self.quiet,
            verbosity: self.verbosity.unwrap_or(self.verbose),
            output: self.output,
            format: self.format,
            passes: self.passes,
            delay_between_passes: Duration::from_secs(self.delay_between_passes),
            port: self.port,
            level: self.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_opt_defaults() {
        let opt = Opt::try_parse_from(["smoketest", "checks.txt"]).expect("should parse");
        let options = opt.into_run_options(&Settings::default());
        assert_eq!(options.level, "live");
        assert_eq!(options.threads, 1);
        assert!(options.cachebust);
        assert!(!options.dry_run);
        assert_eq!(options.passes, 1);
        assert_eq!(options.verbosity, 0);
        assert_eq!(options.format, ReportFormat::Shell);
        assert_eq!(options.input_filenames, vec!["checks.txt".to_string()]);
    }

    #[test]
    fn test_opt_flags() {
        let opt = Opt::try_parse_from([
            "smoketest",
            "a.yaml",
            "b.txt",
            "-l",
            "stag",
            "-s",
            "https",
            "-p",
            "8080",
            "--no-cachebust",
            "-vvv",
            "-f",
            "json",
            "--passes",
            "3",
            "--delay-between-passes",
            "5",
        ])
        .expect("should parse");
        let options = opt.into_run_options(&Settings::default());
        assert_eq!(options.level, "stag");
        assert_eq!(options.scheme.as_deref(), Some("https"));
        assert_eq!(options.port, Some(8080));
        assert!(!options.cachebust);
        assert_eq!(options.verbosity, 3);
        assert_eq!(options.format, ReportFormat::Json);
        assert_eq!(options.passes, 3);
        assert_eq!(options.delay_between_passes, Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_verbosity_wins_over_count() {
        let opt = Opt::try_parse_from(["smoketest", "a.txt", "-v", "--verbosity", "4"])
            .expect("should parse");
        assert_eq!(opt.into_run_options(&Settings::default()).verbosity, 4);
    }

    #[test]
    fn test_threads_default_from_settings() {
        let settings = Settings::from_yaml("default_threads:\n  stag: 6\n  other: 2\n")
            .expect("settings should parse");
        let opt = Opt::try_parse_from(["smoketest", "a.txt", "-l", "stag"]).expect("parse");
        assert_eq!(opt.into_run_options(&settings).threads, 6);

        let opt = Opt::try_parse_from(["smoketest", "a.txt", "-t", "3"]).expect("parse");
        assert_eq!(opt.into_run_options(&settings).threads, 3);
    }

    #[test]
    fn test_run_options_serialize_delay_as_seconds() {
        let options = RunOptions {
            delay_between_passes: Duration::from_secs(7),
            ..Default::default()
        };
        let json = serde_json::to_value(&options).expect("serialize");
        assert_eq!(json["delay_between_passes_secs"], 7);
        assert_eq!(json["format"], "shell");
    }
}
