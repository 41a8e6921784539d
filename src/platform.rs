//! Platforms: named sets of extra request headers simulating a device class.
//!
//! The registry always holds `Desktop` (no extra headers) and `Mobile`
//! (headers from `mobile_headers` in the settings file); the settings file
//! can register more under `platforms`. Lookups title-case the requested
//! name, so `mobile`, `MOBILE` and `Mobile` are the same platform.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::Settings;
use crate::error_handling::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub name: String,
    pub headers: HeaderMap,
}

impl Platform {
    pub fn new(name: &str, headers: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (key, value) in headers {
            let invalid = || ConfigError::InvalidHeader {
                platform: name.to_string(),
                name: key.clone(),
            };
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            map.insert(header_name, header_value);
        }
        Ok(Self {
            name: name.to_lowercase(),
            headers: map,
        })
    }

    pub fn desktop() -> Self {
        Self {
            name: "desktop".to_string(),
            headers: HeaderMap::new(),
        }
    }
}

/// The closed set of platforms a directive may name.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    platforms: BTreeMap<String, Platform>,
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        let mut platforms = BTreeMap::new();
        platforms.insert(title_case("desktop"), Platform::desktop());
        platforms.insert(
            title_case("mobile"),
            Platform {
                name: "mobile".to_string(),
                headers: HeaderMap::new(),
            },
        );
        Self { platforms }
    }
}

impl PlatformRegistry {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        registry.register(Platform::new("mobile", &settings.mobile_headers)?);
        for (name, headers) in &settings.platforms {
            registry.register(Platform::new(name, headers)?);
        }
        Ok(registry)
    }

    pub fn register(&mut self, platform: Platform) {
        self.platforms.insert(title_case(&platform.name), platform);
    }

    /// Looks up a platform by name, ignoring case.
    pub fn resolve(&self, name: &str) -> Result<Platform, ConfigError> {
        let key = title_case(name);
        self.platforms
            .get(&key)
            .cloned()
            .ok_or(ConfigError::UnknownPlatform(key))
    }

    /// Resolves every name, failing on the first unknown one.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Platform>, ConfigError> {
        names.iter().map(|n| self.resolve(n.as_ref())).collect()
    }
}

/// Uppercases the first letter of every word and lowercases the rest.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_mobile_headers() -> Settings {
        Settings::from_yaml("mobile_headers:\n  X-Is-Mobile: 'yes'\n").expect("settings")
    }

    #[test]
    fn test_mobile_headers_come_from_settings() {
        let registry =
            PlatformRegistry::from_settings(&settings_with_mobile_headers()).expect("registry");
        let mobile = registry.resolve("mobile").expect("mobile exists");
        assert_eq!(mobile.name, "mobile");
        assert_eq!(
            mobile.headers.get("x-is-mobile").and_then(|v| v.to_str().ok()),
            Some("yes")
        );
    }

    #[test]
    fn test_desktop_has_no_headers() {
        let registry = PlatformRegistry::default();
        assert!(registry.resolve("desktop").expect("desktop").headers.is_empty());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = PlatformRegistry::default();
        assert_eq!(
            registry.resolve("DESKTOP").expect("desktop"),
            Platform::desktop()
        );
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let registry =
            PlatformRegistry::from_settings(&settings_with_mobile_headers()).expect("registry");
        let names: Vec<String> = registry
            .resolve_all(&["mobile", "desktop"])
            .expect("both exist")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["mobile", "desktop"]);
    }

    #[test]
    fn test_unknown_platform_is_an_error() {
        let registry = PlatformRegistry::default();
        let err = registry.resolve("tablet").expect_err("tablet isn't registered");
        assert!(matches!(err, ConfigError::UnknownPlatform(name) if name == "Tablet"));
    }

    #[test]
    fn test_settings_can_register_platforms() {
        let settings = Settings::from_yaml("platforms:\n  tablet:\n    X-Device: tablet\n")
            .expect("settings");
        let registry = PlatformRegistry::from_settings(&settings).expect("registry");
        assert_eq!(registry.resolve("Tablet").expect("tablet").name, "tablet");
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            Platform::new("mobile", &headers),
            Err(ConfigError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("mobile"), "Mobile");
        assert_eq!(title_case("sMART tv"), "Smart Tv");
    }
}
