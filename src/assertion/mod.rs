//! Assertion engine.
//!
//! A closed catalog of assertion kinds, each turning a fetched [`Response`]
//! into a [`TestResult`]. Evaluation never fails: problems such as a missing
//! schema file or an unparseable body become a failing result whose
//! description says what went wrong.

mod builders;
pub mod dtd;
mod html;
mod json;
mod matching;
mod metadata;
mod status;
mod xml;

pub use builders::{default_builders, AssertionBuilder, AssertionContext};
pub use html::{HtmlAssertion, When};
pub use json::{json_value_text, select_from_json, JsonAssertion, JsonSchemaAssertion};
pub use matching::{normalize_whitespace, MatchMethod, TextMatchingRule};
pub use metadata::{HeaderAssertion, ResponseTimeAssertion};
pub use status::{status_matches, RedirectAssertion, StatusAssertion};
pub use xml::{DtdAssertion, XmlRootAssertion};

use crate::fetch::Response;

/// Description reported for every assertion in a dry run.
pub const DRY_RUN_DESCRIPTION: &str = "not checked (dry run)";

/// Outcome of one assertion against one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub passed: bool,
    /// What was observed, in the past tense ("status code was 200").
    pub description: String,
}

impl TestResult {
    pub fn passed(description: impl Into<String>) -> Self {
        Self {
            passed: true,
            description: description.into(),
        }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            passed: false,
            description: description.into(),
        }
    }

    pub fn dry_run() -> Self {
        Self::passed(DRY_RUN_DESCRIPTION)
    }
}

#[derive(Debug, Clone)]
pub enum Assertion {
    Status(StatusAssertion),
    Redirect(RedirectAssertion),
    Html(HtmlAssertion),
    Json(JsonAssertion),
    Header(HeaderAssertion),
    ResponseTime(ResponseTimeAssertion),
    XmlRoot(XmlRootAssertion),
    Dtd(DtdAssertion),
    JsonSchema(JsonSchemaAssertion),
}

impl Assertion {
    /// Short name of the assertion kind, used in structured reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Assertion::Status(_) => "status",
            Assertion::Redirect(_) => "redirect",
            Assertion::Html(_) => "html",
            Assertion::Json(_) => "json",
            Assertion::Header(_) => "header",
            Assertion::ResponseTime(_) => "response_time",
            Assertion::XmlRoot(_) => "xml_root",
            Assertion::Dtd(_) => "dtd",
            Assertion::JsonSchema(_) => "json_schema",
        }
    }

    /// What the assertion expects, in the present tense.
    pub fn description(&self) -> String {
        match self {
            Assertion::Status(a) => a.description(),
            Assertion::Redirect(a) => a.description(),
            Assertion::Html(a) => a.description(),
            Assertion::Json(a) => a.description(),
            Assertion::Header(a) => a.description(),
            Assertion::ResponseTime(a) => a.description(),
            Assertion::XmlRoot(a) => a.description(),
            Assertion::Dtd(a) => a.description(),
            Assertion::JsonSchema(a) => a.description(),
        }
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        match self {
            Assertion::Status(a) => a.evaluate(response),
            Assertion::Redirect(a) => a.evaluate(response),
            Assertion::Html(a) => a.evaluate(response),
            Assertion::Json(a) => a.evaluate(response),
            Assertion::Header(a) => a.evaluate(response),
            Assertion::ResponseTime(a) => a.evaluate(response),
            Assertion::XmlRoot(a) => a.evaluate(response),
            Assertion::Dtd(a) => a.evaluate(response),
            Assertion::JsonSchema(a) => a.evaluate(response),
        }
    }
}
