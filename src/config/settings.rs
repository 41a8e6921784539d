//! Optional YAML settings file.
//!
//! Site-specific configuration that rarely changes between runs lives in
//! `settings.yaml` next to the test files: default worker counts per level,
//! the mobile platform's headers, URL special cases, and so on. A missing
//! file is not an error; everything has a default.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::config::constants::{
    DEFAULT_LEVEL_TOKEN, DEFAULT_REQUEST_TIMEOUT, DEFAULT_THREADS, DEFAULT_USER_AGENT,
    OTHER_LEVEL_KEY,
};
use crate::error_handling::ConfigError;

/// Contents of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Worker count per level, with an `other` fallback.
    pub default_threads: BTreeMap<String, usize>,

    /// User agent used when `--user-agent` isn't given.
    pub default_user_agent: Option<String>,

    /// Literal substring replacements applied to every transformed URL, in
    /// file order.
    #[serde(deserialize_with = "ordered_string_pairs")]
    pub special_cases_url_transforms: Vec<(String, String)>,

    /// Extra request headers for the `mobile` platform.
    pub mobile_headers: BTreeMap<String, String>,

    /// Additional named platforms and their request headers.
    pub platforms: BTreeMap<String, BTreeMap<String, String>>,

    /// PEM bundle used to verify server certificates. When absent,
    /// certificates are not verified.
    pub ca_path: Option<PathBuf>,

    /// Default per-request timeout in seconds.
    pub timeout: Option<f64>,

    /// Replaces `{LEVEL}` as the level placeholder in URLs.
    pub level_token: Option<String>,
}

impl Settings {
    /// Loads settings from `path`.
    ///
    /// A file that doesn't exist yields the defaults. An unreadable or
    /// malformed file is an error: silently ignoring a broken settings file
    /// would run the whole suite against the wrong hosts.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            log::debug!(
                "No settings file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Settings {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&text).map_err(|e| ConfigError::Settings {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parses settings from YAML text. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Option<Settings> = serde_yaml::from_str(text)?;
        Ok(settings.unwrap_or_default())
    }

    /// Worker count for `level`, falling back to `other`, then to 1.
    pub fn default_threads_for(&self, level: &str) -> usize {
        self.default_threads
            .get(level)
            .or_else(|| self.default_threads.get(OTHER_LEVEL_KEY))
            .copied()
            .unwrap_or(DEFAULT_THREADS)
    }

    pub fn user_agent(&self) -> String {
        self.default_user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    /// Default request timeout. Non-positive or non-finite values fall back
    /// to the built-in default.
    pub fn request_timeout(&self) -> Duration {
        self.timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn level_token(&self) -> &str {
        self.level_token.as_deref().unwrap_or(DEFAULT_LEVEL_TOKEN)
    }
}

/// Deserializes a YAML mapping into `(key, value)` pairs, keeping file order.
fn ordered_string_pairs<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of strings to strings")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, String>()? {
                pairs.push((key, value));
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_any(PairsVisitor)
}
