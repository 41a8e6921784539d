//! Status code and redirect assertions.

use crate::fetch::Response;
use crate::transform::uncachebust;

use super::TestResult;

/// Digit-wise match of `target` against `status`; an `X` (either case) in
/// the target matches any digit. Codes of different lengths never match.
pub fn status_matches(target: &str, status: u16) -> bool {
    let seen = status.to_string();
    if target.chars().count() != seen.len() {
        return false;
    }
    target
        .chars()
        .zip(seen.chars())
        .all(|(wished, seen)| wished.eq_ignore_ascii_case(&'x') || wished == seen)
}

#[derive(Debug, Clone)]
pub struct StatusAssertion {
    pub target: String,
}

impl StatusAssertion {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn description(&self) -> String {
        format!("status code is {}", self.target)
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        TestResult {
            passed: status_matches(&self.target, response.status),
            description: format!("status code was {}", response.status),
        }
    }
}

/// A status assertion that also checks where the response points.
///
/// Without redirect following, the `Location` header is compared; with it,
/// the final URL. Either is uncachebusted first, since servers often keep
/// or drop the cachebuster when redirecting.
#[derive(Debug, Clone)]
pub struct RedirectAssertion {
    pub target: String,
    pub location: Option<String>,
    pub follow_redirects: bool,
}

impl RedirectAssertion {
    pub fn new(target: impl Into<String>, location: Option<String>, follow_redirects: bool) -> Self {
        Self {
            target: target.into(),
            location,
            follow_redirects,
        }
    }

    fn location_label(&self) -> &'static str {
        if self.follow_redirects {
            "final "
        } else {
            ""
        }
    }

    pub fn description(&self) -> String {
        format!(
            "status code is {} and {}location is {}",
            self.target,
            self.location_label(),
            self.location.as_deref().unwrap_or("not present"),
        )
    }

    fn actual_location(&self, response: &Response) -> Option<String> {
        if self.follow_redirects {
            Some(uncachebust(&response.final_url))
        } else {
            response.location().map(|l| uncachebust(&l))
        }
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        let actual = self.actual_location(response);
        let passed = status_matches(&self.target, response.status) && actual == self.location;
        TestResult {
            passed,
            description: format!(
                "status code was {} and {}location was {}",
                response.status,
                self.location_label(),
                actual.as_deref().unwrap_or("not present"),
            ),
        }
    }
}
