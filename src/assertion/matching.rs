//! Text matching rules shared by HTML, JSON and header assertions.

use regex::Regex;
use strum_macros::EnumIter;

use crate::error_handling::ConfigError;

/// How a rule compares its pattern to a candidate.
///
/// Declaration order is the order rules are built from a record that names
/// several methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum MatchMethod {
    Regex,
    StartsWith,
    EndsWith,
    Equals,
    Contains,
}

impl MatchMethod {
    /// Key naming this method in directive records.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Regex => "regex",
            MatchMethod::StartsWith => "startswith",
            MatchMethod::EndsWith => "endswith",
            MatchMethod::Equals => "equals",
            MatchMethod::Contains => "contains",
        }
    }
}

/// A method and a pattern, both compared after whitespace normalization.
#[derive(Debug, Clone)]
pub struct TextMatchingRule {
    method: MatchMethod,
    pattern: String,
    regex: Option<Regex>,
}

impl TextMatchingRule {
    pub fn new(method: MatchMethod, pattern: &str) -> Result<Self, ConfigError> {
        let pattern = normalize_whitespace(pattern);
        let regex = match method {
            MatchMethod::Regex => Some(Regex::new(&pattern).map_err(|source| {
                ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    source,
                }
            })?),
            _ => None,
        };
        Ok(Self {
            method,
            pattern,
            regex,
        })
    }

    pub fn method(&self) -> MatchMethod {
        self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Regexes search anywhere in the candidate; they are not anchored.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = normalize_whitespace(candidate);
        match (&self.regex, self.method) {
            (Some(regex), _) => regex.is_match(&candidate),
            (None, MatchMethod::StartsWith) => candidate.starts_with(&self.pattern),
            (None, MatchMethod::EndsWith) => candidate.ends_with(&self.pattern),
            (None, MatchMethod::Contains) => candidate.contains(&self.pattern),
            (None, _) => candidate == self.pattern,
        }
    }

    pub fn description(&self) -> String {
        match self.method {
            MatchMethod::Regex => format!("matches the regex {}", self.pattern),
            method => format!("{} {}", method.as_str(), self.pattern),
        }
    }
}

fn is_html_whitespace(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{A0}'
    )
}

/// Collapses every run of whitespace (non-breaking space included) into one
/// ASCII space and trims both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split(is_html_whitespace)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
