//! JSON body assertions: dot-path selection and JSON Schema validation.

use std::path::Path;

use serde_json::Value;

use crate::fetch::Response;

use super::matching::TextMatchingRule;
use super::TestResult;

/// Walks `selector` (dot-separated keys and array indexes) into `document`.
///
/// An empty selector selects the whole document. Array indexes may be
/// negative to count from the end. Errors name the part of the selector
/// that had been consumed when the walk failed.
pub fn select_from_json<'a>(document: &'a Value, selector: &str) -> Result<&'a Value, String> {
    if selector.is_empty() {
        return Ok(document);
    }

    let mut here = document;
    let mut selected: Vec<&str> = Vec::new();
    for part in selector.split('.') {
        selected.push(part);
        let path = || selected.join(".");
        here = match here {
            Value::Object(map) => map
                .get(part)
                .ok_or_else(|| format!("Key {} not found", path()))?,
            Value::Array(items) => {
                let index: i64 = part
                    .parse()
                    .map_err(|_| format!("Array found at {}", path()))?;
                let resolved = if index < 0 {
                    items.len() as i64 + index
                } else {
                    index
                };
                usize::try_from(resolved)
                    .ok()
                    .and_then(|i| items.get(i))
                    .ok_or_else(|| format!("Index {} not found", path()))?
            }
            _ => {
                return Err(format!(
                    "Ran out of containers to select from at {}",
                    path()
                ))
            }
        };
    }
    Ok(here)
}

/// Text form of a selected value: strings verbatim, everything else as
/// compact JSON.
pub fn json_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct JsonAssertion {
    pub selector: String,
    pub rule: TextMatchingRule,
}

impl JsonAssertion {
    pub fn new(selector: impl Into<String>, rule: TextMatchingRule) -> Self {
        Self {
            selector: selector.into(),
            rule,
        }
    }

    pub fn description(&self) -> String {
        format!("{} {}", self.selector, self.rule.description())
    }

    fn selected_text(&self, body: &str) -> Result<String, String> {
        let document: Value =
            serde_json::from_str(body).map_err(|e| format!("Response body was not valid JSON: {e}"))?;
        select_from_json(&document, &self.selector).map(json_value_text)
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        match self.selected_text(&response.body) {
            Ok(text) => TestResult {
                passed: self.rule.matches(&text),
                description: format!("{} was {}", self.selector, text),
            },
            Err(error) => TestResult::failed(format!(
                "Error trying to find {}: {}",
                self.selector, error
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonSchemaAssertion {
    pub schema_filename: String,
}

impl JsonSchemaAssertion {
    pub fn new(schema_filename: impl Into<String>) -> Self {
        Self {
            schema_filename: schema_filename.into(),
        }
    }

    pub fn description(&self) -> String {
        format!("Response body obeys {}", self.schema_filename)
    }

    /// Each way of failing gets its own message: missing schema, schema not
    /// JSON, body not JSON, schema itself invalid, body not conforming.
    pub fn evaluate(&self, response: &Response) -> TestResult {
        let filename = &self.schema_filename;
        if !Path::new(filename).is_file() {
            return TestResult::failed(format!("Schema file {filename} not found"));
        }
        let schema: Value = match std::fs::read_to_string(filename)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
        {
            Some(schema) => schema,
            None => return TestResult::failed(format!("Schema file {filename} was not valid JSON")),
        };
        let instance: Value = match serde_json::from_str(&response.body) {
            Ok(instance) => instance,
            Err(_) => return TestResult::failed("Response body was not valid JSON"),
        };
        let validator = match jsonschema::validator_for(&schema) {
            Ok(validator) => validator,
            Err(e) => {
                return TestResult::failed(format!("Schema file {filename} had a problem: {e}"))
            }
        };
        match validator.validate(&instance) {
            Ok(()) => TestResult::passed(format!("Response body obeyed {filename}")),
            Err(e) => TestResult::failed(format!("Response did not obey {filename}: {e}")),
        }
    }
}
