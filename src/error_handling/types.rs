//! Error type definitions.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The CA bundle named in the settings file couldn't be loaded.
    #[error("CA bundle {path} could not be loaded: {message}")]
    CertificateError { path: String, message: String },
}

/// Structurally invalid configuration: a bad settings file or a directive
/// record that can't be turned into a directive.
///
/// These are fatal. They abort the run before any directive executes.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown platform \"{0}\"")]
    UnknownPlatform(String),

    #[error("unknown directive type \"{0}\"")]
    UnknownDirective(String),

    #[error("only_levels should be a list, not {0}")]
    OnlyLevelsNotList(String),

    #[error("invalid only_levels pattern \"{pattern}\": {source}")]
    InvalidLevelPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid regex \"{pattern}\": {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid CSS selector \"{selector}\": {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("directive has neither \"url\" nor \"urls\"")]
    MissingUrl,

    #[error("no URL for level \"{0}\" and no \"other\" fallback")]
    NoUrlForLevel(String),

    #[error("invalid response_time {0}")]
    InvalidResponseTime(f64),

    #[error("invalid timeout {0}")]
    InvalidTimeout(f64),

    #[error("invalid header \"{name}\" for platform {platform}")]
    InvalidHeader { platform: String, name: String },

    #[error("invalid directive: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("invalid settings file {path}: {message}")]
    Settings { path: String, message: String },
}

/// A problem with one input file, reported with the file's name.
#[derive(Error, Debug)]
#[error("Smoketest had a problem with the input file \"{filename}\": {message}")]
pub struct InputFileError {
    pub filename: String,
    pub message: String,
}

impl InputFileError {
    pub fn new(filename: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            filename: filename.into(),
            message: message.to_string(),
        }
    }
}

/// Anything that stops the directive files from loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Input(#[from] InputFileError),

    #[error("Smoketest had a problem with the input file \"{filename}\": {source}")]
    Config {
        filename: String,
        #[source]
        source: ConfigError,
    },
}

impl LoadError {
    pub fn config(filename: impl Into<String>, source: ConfigError) -> Self {
        LoadError::Config {
            filename: filename.into(),
            source,
        }
    }
}

/// A login step failed while opening a directive's session.
///
/// Always recovered: the directive reports it against the login URL and
/// continues unauthenticated.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct SessionError {
    pub url: String,
    pub message: String,
}

/// Categories of transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FetchErrorKind {
    Timeout,
    Connect,
    Redirect,
    Body,
    Request,
    Other,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Timeout => "request timed out",
            FetchErrorKind::Connect => "connection failed",
            FetchErrorKind::Redirect => "redirect error",
            FetchErrorKind::Body => "error reading response body",
            FetchErrorKind::Request => "request error",
            FetchErrorKind::Other => "HTTP error",
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetch that produced no response.
#[derive(Error, Debug)]
#[error("{kind}: {source}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    #[source]
    pub source: ReqwestError,
}

impl From<ReqwestError> for FetchError {
    fn from(source: ReqwestError) -> Self {
        Self {
            kind: super::categorize_reqwest_error(&source),
            source,
        }
    }
}
