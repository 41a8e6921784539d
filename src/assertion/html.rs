//! CSS-selector assertions against the response's HTML.

use scraper::{ElementRef, Selector};

use crate::error_handling::ConfigError;
use crate::fetch::Response;

use super::matching::{normalize_whitespace, TextMatchingRule};
use super::TestResult;

/// Whether the selected element should exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum When {
    #[default]
    Always,
    Never,
}

#[derive(Debug, Clone)]
pub struct HtmlAssertion {
    pub selector_text: String,
    selector: Selector,
    /// Attribute to test; the element's text content when absent.
    pub attribute: Option<String>,
    pub rule: Option<TextMatchingRule>,
    pub when: When,
}

impl HtmlAssertion {
    pub fn new(
        selector: &str,
        attribute: Option<String>,
        rule: Option<TextMatchingRule>,
        when: When,
    ) -> Result<Self, ConfigError> {
        let parsed = Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            selector_text: selector.to_string(),
            selector: parsed,
            attribute,
            rule,
            when,
        })
    }

    fn target_label(&self) -> &str {
        self.attribute.as_deref().unwrap_or("text")
    }

    pub fn description(&self) -> String {
        match (self.when, &self.rule) {
            (When::Never, _) => format!("{} is not present", self.selector_text),
            (When::Always, Some(rule)) => format!(
                "{} {} {}",
                self.selector_text,
                self.target_label(),
                rule.description()
            ),
            (When::Always, None) => {
                format!("{} {} is present", self.selector_text, self.target_label())
            }
        }
    }

    /// The normalized text or attribute of the first matching element.
    ///
    /// The outer `Option` is whether an element was found at all; an
    /// unparseable document counts as "no element".
    fn observed(&self, response: &Response) -> Option<Option<String>> {
        let document = response.html()?;
        let element = document.select(&self.selector).next()?;
        Some(self.value_of(element))
    }

    fn value_of(&self, element: ElementRef<'_>) -> Option<String> {
        match &self.attribute {
            None => Some(normalize_whitespace(&element.text().collect::<String>())),
            Some(attribute) => element.value().attr(attribute).map(normalize_whitespace),
        }
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        let observed = self.observed(response);
        let passed = match (self.when, &observed) {
            (When::Never, found) => found.is_none(),
            (When::Always, Some(Some(value))) => {
                self.rule.as_ref().map_or(true, |rule| rule.matches(value))
            }
            (When::Always, _) => false,
        };
        TestResult {
            passed,
            description: format!(
                "{} {} was: {}",
                self.selector_text,
                self.target_label(),
                observed.flatten().as_deref().unwrap_or("not present"),
            ),
        }
    }
}
