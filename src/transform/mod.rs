//! URL transformation.
//!
//! Directive files are written against the live site. Before a URL is
//! fetched it is adapted to the target environment by a fixed pipeline:
//!
//! 1. scheme override
//! 2. port override
//! 3. level transform
//! 4. cachebusting
//! 5. special-case substring replacements from the settings file
//!
//! The order matters: cachebusting must see the final host and path, and
//! special cases see the finished URL.

mod parts;

pub use parts::UrlParts;

use crate::config::{Settings, CACHEBUST_KEY, DEFAULT_LEVEL_TOKEN, LIVE_LEVEL};

/// Which transforms to apply. Every field is independently optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions<'a> {
    pub scheme: Option<&'a str>,
    pub port: Option<u16>,
    pub level: Option<&'a str>,
    pub cachebust: bool,
}

/// Rewrites canonical URLs for a target environment.
#[derive(Debug, Clone)]
pub struct UrlTransformer {
    level_token: String,
    special_cases: Vec<(String, String)>,
}

impl Default for UrlTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_TOKEN, Vec::new())
    }
}

impl UrlTransformer {
    pub fn new(level_token: impl Into<String>, special_cases: Vec<(String, String)>) -> Self {
        Self {
            level_token: level_token.into(),
            special_cases,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.level_token(),
            settings.special_cases_url_transforms.clone(),
        )
    }

    pub fn transform(&self, url: &str, options: &TransformOptions<'_>) -> String {
        let mut parts = UrlParts::split(url);
        if let Some(scheme) = options.scheme.filter(|s| !s.is_empty()) {
            parts.scheme = scheme.to_string();
        }
        if let Some(port) = options.port {
            port_transform(&mut parts, port);
        }
        if let Some(level) = options.level {
            self.level_transform(&mut parts, level);
        }
        if options.cachebust {
            cachebust_transform(&mut parts, chrono::Utc::now().timestamp_millis());
        }
        self.special_cases_transform(parts.join())
    }

    /// Adapts host and path to `level`.
    ///
    /// With the level token present anywhere in host or path, the token is
    /// replaced by the level name (empty on live) and the leftovers of an
    /// empty replacement are cleaned up. Without it, the first host label is
    /// suffixed: `www.example.com` becomes `www-stag.example.com`. Hosts with
    /// fewer than three labels have no subdomain to decorate.
    fn level_transform(&self, parts: &mut UrlParts, level: &str) {
        let token = self.level_token.as_str();
        let has_token =
            !token.is_empty() && (parts.netloc.contains(token) || parts.path.contains(token));

        if has_token {
            let level = if level == LIVE_LEVEL { "" } else { level };

            if !parts.netloc.is_empty() {
                let mut host = parts
                    .netloc
                    .replace(token, level)
                    .replace("..", ".")
                    .replace("-.", ".");
                if host.starts_with(['-', '.']) {
                    host.remove(0);
                }
                parts.netloc = host;
            }

            if !parts.path.is_empty() {
                let token_dir = format!("{token}/");
                parts.path = if level.is_empty() && parts.path.contains(&token_dir) {
                    parts.path.replace(&token_dir, "")
                } else {
                    parts.path.replace(token, level)
                };
            }
            return;
        }

        if level == LIVE_LEVEL {
            return;
        }

        let mut labels = parts.netloc.splitn(3, '.');
        let (Some(first), Some(second), Some(remaining)) =
            (labels.next(), labels.next(), labels.next())
        else {
            return;
        };
        parts.netloc = format!("{first}-{level}.{second}.{remaining}");
    }

    fn special_cases_transform(&self, mut url: String) -> String {
        for (from, to) in &self.special_cases {
            url = url.replace(from.as_str(), to);
        }
        url
    }
}

/// Replaces the port on the authority, appending one if there is none.
fn port_transform(parts: &mut UrlParts, port: u16) {
    let host = parts
        .netloc
        .split_once(':')
        .map_or(parts.netloc.as_str(), |(host, _)| host);
    parts.netloc = format!("{host}:{port}");
}

fn cachebust_transform(parts: &mut UrlParts, buster: i64) {
    if parts.path.is_empty() {
        parts.path.push('/');
    }
    parts.query = without_cachebuster(&parts.query);
    if !parts.query.is_empty() {
        parts.query.push('&');
    }
    parts.query.push_str(&format!("{CACHEBUST_KEY}={buster}"));
}

/// Removes every `_` query parameter, keeping the others in order.
///
/// Servers often drop or keep the cachebuster when redirecting; comparisons
/// against an expected location are made without it.
pub fn uncachebust(url: &str) -> String {
    let mut parts = UrlParts::split(url);
    parts.query = without_cachebuster(&parts.query);
    parts.join()
}

/// `query` minus its `_` pairs. The other pairs are kept byte for byte.
fn without_cachebuster(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| pair.split_once('=').map_or(*pair, |(key, _)| key) != CACHEBUST_KEY)
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests;
