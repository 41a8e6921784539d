//! Configuration constants.
//!
//! Defaults used when neither the settings file nor the command line
//! provides a value.

use std::time::Duration;

/// Default per-request timeout when neither the directive nor the settings
/// file specifies one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Token that marks where the level name goes in a URL.
///
/// `http://www-{LEVEL}.example.com` becomes `http://www-stag.example.com` on
/// the `stag` level and `http://www.example.com` on `live`.
pub const DEFAULT_LEVEL_TOKEN: &str = "{LEVEL}";

/// The level that addresses the production site. URLs are left untouched on
/// this level unless they carry the level token.
pub const LIVE_LEVEL: &str = "live";

/// Key used for per-level mappings when the current level has no entry.
pub const OTHER_LEVEL_KEY: &str = "other";

/// Query parameter appended by cachebusting.
pub const CACHEBUST_KEY: &str = "_";

/// Default User-Agent string for HTTP requests.
///
/// Can be overridden by `default_user_agent` in the settings file or the
/// `--user-agent` flag.
pub const DEFAULT_USER_AGENT: &str = concat!("smoketest/", env!("CARGO_PKG_VERSION"));

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yaml";

/// Worker count when the settings file has no `default_threads`.
pub const DEFAULT_THREADS: usize = 1;

/// Maximum number of redirect hops followed when a directive sets
/// `follow_redirects`.
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Platform used when a directive doesn't list any.
pub const DEFAULT_PLATFORM: &str = "desktop";

/// Default status code expected by a check.
pub const DEFAULT_STATUS: &str = "200";

/// Namespace of sitemap and sitemap index documents.
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
