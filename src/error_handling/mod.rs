//! Error handling.
//!
//! Errors fall into three groups:
//! - **Fatal**: `ConfigError`, `InputFileError`, `InitializationError` abort
//!   the run before any directive executes
//! - **Recovered per URL**: `FetchError` is reported as an error event and
//!   marks the URL failed
//! - **Recovered per session**: `SessionError` is reported against the login
//!   URL and the directive continues unauthenticated
//!
//! Assertion evaluation never produces an error value; problems become a
//! failing result with a description.

mod categorization;
mod types;

pub use categorization::categorize_reqwest_error;
pub use types::{
    ConfigError, FetchError, FetchErrorKind, InitializationError, InputFileError, LoadError,
    SessionError,
};
