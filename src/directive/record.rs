//! Raw directive records as they appear in JSON and YAML input files.
//!
//! Records are deserialized strictly: an unknown key anywhere in a check
//! record is a configuration error rather than a silently ignored typo.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::assertion::{MatchMethod, TextMatchingRule, When};
use crate::error_handling::ConfigError;

/// A string, number or boolean written where text is expected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(s) => f.write_str(s),
            ScalarValue::Integer(i) => write!(f, "{i}"),
            ScalarValue::Float(x) => write!(f, "{x}"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A URL, or a choice of URL per level with an `other` fallback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UrlEntry {
    Plain(String),
    PerLevel(BTreeMap<String, String>),
}

/// `url`/`urls` accept one entry or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UrlField {
    One(UrlEntry),
    Many(Vec<UrlEntry>),
}

impl UrlField {
    pub fn entries(&self) -> Vec<&UrlEntry> {
        match self {
            UrlField::One(entry) => vec![entry],
            UrlField::Many(entries) => entries.iter().collect(),
        }
    }
}

/// A status code, or a choice of status code per level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusSpec {
    Code(ScalarValue),
    PerLevel(BTreeMap<String, ScalarValue>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectSpec {
    pub status: Option<ScalarValue>,
    pub location: Option<String>,
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HtmlSpec {
    pub selector: String,
    pub attribute: Option<String>,
    #[serde(default)]
    pub when: When,
    pub regex: Option<ScalarValue>,
    pub startswith: Option<ScalarValue>,
    pub endswith: Option<ScalarValue>,
    pub equals: Option<ScalarValue>,
    pub contains: Option<ScalarValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonSpec {
    pub selector: String,
    pub regex: Option<ScalarValue>,
    pub startswith: Option<ScalarValue>,
    pub endswith: Option<ScalarValue>,
    pub equals: Option<ScalarValue>,
    pub contains: Option<ScalarValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderSpec {
    pub header: String,
    pub regex: Option<ScalarValue>,
    pub startswith: Option<ScalarValue>,
    pub endswith: Option<ScalarValue>,
    pub equals: Option<ScalarValue>,
    pub contains: Option<ScalarValue>,
}

/// Records that carry text-matching keys.
pub trait TextMatchKeys {
    fn pattern(&self, method: MatchMethod) -> Option<&ScalarValue>;

    /// One rule per matching key present, in [`MatchMethod`] order.
    fn rules(&self) -> Result<Vec<TextMatchingRule>, ConfigError> {
        use strum::IntoEnumIterator;
        MatchMethod::iter()
            .filter_map(|method| {
                self.pattern(method)
                    .map(|p| TextMatchingRule::new(method, &p.to_string()))
            })
            .collect()
    }
}

macro_rules! impl_text_match_keys {
    ($($spec:ty),*) => {
        $(
            impl TextMatchKeys for $spec {
                fn pattern(&self, method: MatchMethod) -> Option<&ScalarValue> {
                    match method {
                        MatchMethod::Regex => self.regex.as_ref(),
                        MatchMethod::StartsWith => self.startswith.as_ref(),
                        MatchMethod::EndsWith => self.endswith.as_ref(),
                        MatchMethod::Equals => self.equals.as_ref(),
                        MatchMethod::Contains => self.contains.as_ref(),
                    }
                }
            }
        )*
    };
}

impl_text_match_keys!(HtmlSpec, JsonSpec, HeaderSpec);

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XmlSpec {
    pub root: Option<String>,
    pub dtd_filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonSchemaSpec {
    pub schema_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// A form login that should leave the session holding cookies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginInstructions {
    pub url: String,
    #[serde(default)]
    pub data: BTreeMap<String, ScalarValue>,
}

/// A `check` directive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckRecord {
    #[serde(default)]
    pub directive: Option<String>,
    pub url: Option<UrlField>,
    pub urls: Option<UrlField>,
    pub status: Option<StatusSpec>,
    pub redirect: Option<RedirectSpec>,
    #[serde(default)]
    pub html: Vec<HtmlSpec>,
    #[serde(default)]
    pub json: Vec<JsonSpec>,
    #[serde(default)]
    pub headers: Vec<HeaderSpec>,
    pub response_time: Option<f64>,
    pub xml: Option<XmlSpec>,
    pub json_schema: Option<JsonSchemaSpec>,
    pub platforms: Option<Vec<String>>,
    pub timeout: Option<f64>,
    #[serde(default)]
    pub follow_redirects: bool,
    pub basic_auth_instructions: Option<BasicAuth>,
    pub auth_cookie_instructions: Option<LoginInstructions>,
    /// Checked by the input parser before the record is deserialized.
    pub only_levels: Option<serde_json::Value>,
}

impl CheckRecord {
    /// A check of one URL with default assertions.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(UrlField::One(UrlEntry::Plain(url.into()))),
            ..Default::default()
        }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// An `include` directive.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeRecord {
    #[serde(default)]
    pub directive: Option<String>,
    pub filename: String,
    pub only_levels: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_check_record() {
        let record = CheckRecord::from_value(json!({
            "directive": "check",
            "urls": ["http://www.example.com/", {"stag": "http://staging.example.com/", "other": "http://www.example.com/x"}],
            "status": {"live": 200, "other": "30X"},
            "html": [{"selector": "h1", "equals": "Hello", "contains": "ell"}],
            "json": [{"selector": "a.b", "equals": 3}],
            "headers": [{"header": "X-Cache", "regex": "HIT"}],
            "response_time": 1.5,
            "xml": {"root": "rss"},
            "json_schema": {"schema_filename": "schema.json"},
            "platforms": ["desktop", "mobile"],
            "timeout": 5,
            "follow_redirects": true,
            "basic_auth_instructions": {"username": "u", "password": "p"},
            "auth_cookie_instructions": {"url": "http://www.example.com/login", "data": {"user": "u", "remember": 1}}
        }))
        .expect("record parses");

        let urls = record.urls.as_ref().expect("urls").entries();
        assert_eq!(urls.len(), 2);
        assert!(matches!(urls[1], UrlEntry::PerLevel(_)));
        assert!(matches!(record.status, Some(StatusSpec::PerLevel(_))));
        assert_eq!(record.html[0].rules().expect("rules").len(), 2);
        assert_eq!(record.json[0].rules().expect("rules")[0].pattern(), "3");
        assert_eq!(record.timeout, Some(5.0));
        assert!(record.follow_redirects);
        assert_eq!(
            record.auth_cookie_instructions.expect("login").data["remember"],
            ScalarValue::Integer(1)
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = CheckRecord::from_value(json!({"url": "http://a.example.com/", "stauts": 200}))
            .expect_err("typo must fail");
        assert!(matches!(err, ConfigError::InvalidRecord(_)));

        let err = CheckRecord::from_value(
            json!({"url": "http://a.example.com/", "html": [{"selector": "h1", "equal": "x"}]}),
        )
        .expect_err("typo in assertion block must fail");
        assert!(err.to_string().contains("equal"));
    }

    #[test]
    fn test_rules_follow_method_order() {
        let spec: HeaderSpec = serde_json::from_value(json!({
            "header": "Server", "contains": "nginx", "regex": "^ng"
        }))
        .expect("spec");
        let methods: Vec<MatchMethod> = spec.rules().expect("rules").iter().map(|r| r.method()).collect();
        assert_eq!(methods, vec![MatchMethod::Regex, MatchMethod::Contains]);
    }

    #[test]
    fn test_when_defaults_to_always() {
        let spec: HtmlSpec = serde_json::from_value(json!({"selector": ".x"})).expect("spec");
        assert_eq!(spec.when, When::Always);
        let spec: HtmlSpec =
            serde_json::from_value(json!({"selector": ".x", "when": "never"})).expect("spec");
        assert_eq!(spec.when, When::Never);
    }
}
