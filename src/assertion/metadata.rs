//! Header and response-time assertions.

use std::time::Duration;

use crate::fetch::Response;

use super::matching::TextMatchingRule;
use super::TestResult;

#[derive(Debug, Clone)]
pub struct HeaderAssertion {
    pub header: String,
    pub rule: TextMatchingRule,
}

impl HeaderAssertion {
    pub fn new(header: impl Into<String>, rule: TextMatchingRule) -> Self {
        Self {
            header: header.into(),
            rule,
        }
    }

    pub fn description(&self) -> String {
        format!("{} header {}", self.header, self.rule.description())
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        match response.header(&self.header) {
            Some(value) => TestResult {
                passed: self.rule.matches(&value),
                description: format!("{} header was {}", self.header, value),
            },
            None => TestResult::failed(format!("{} header was not present", self.header)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseTimeAssertion {
    pub max: Duration,
}

impl ResponseTimeAssertion {
    pub fn new(max: Duration) -> Self {
        Self { max }
    }

    pub fn description(&self) -> String {
        format!("Response time is {} seconds or less", self.max.as_secs_f64())
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        TestResult {
            passed: response.elapsed <= self.max,
            description: format!(
                "Response time was {:.3} seconds",
                response.elapsed.as_secs_f64()
            ),
        }
    }
}
