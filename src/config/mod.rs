//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, well-known keys)
//! - The optional YAML settings file
//! - CLI option types and the resolved `RunOptions`

mod constants;
mod settings;
mod types;

pub use constants::*;
pub use settings::Settings;
pub use types::{LogFormat, LogLevel, Opt, ReportFormat, RunOptions};
