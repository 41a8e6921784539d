//! Structured JSON reporter.
//!
//! Accumulates the whole run in memory and writes one document at the end:
//!
//! ```json
//! {"configuration": {...}, "results": [{"summary": {...}, "urls": [...]}]}
//! ```
//!
//! Failures and errors are always listed; successes only from verbosity 3.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::config::RunOptions;
use crate::platform::Platform;

use super::{
    header_pairs, hops, write_to, Outcome, PassCounters, PassSummary, ReportSink, Reporter,
    TestEvent,
};

#[derive(Debug, Default, Serialize)]
struct JsonDocument {
    configuration: Option<serde_json::Value>,
    results: Vec<PassResults>,
}

#[derive(Debug, Default, Serialize)]
struct PassResults {
    summary: Option<PassSummary>,
    urls: Vec<UrlResult>,
}

#[derive(Debug, Default, Serialize)]
struct UrlResult {
    url: String,
    platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    returned_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hops: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_headers: Option<Vec<(String, String)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_headers: Option<Vec<(String, String)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    /// Error message, for URLs that produced no response.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,
}

pub struct JsonReporter {
    sink: ReportSink,
    verbosity: u8,
    counters: PassCounters,
    document: Mutex<JsonDocument>,
}

impl JsonReporter {
    pub fn new(sink: ReportSink, verbosity: u8) -> Self {
        Self {
            sink,
            verbosity,
            counters: PassCounters::new(),
            document: Mutex::new(JsonDocument::default()),
        }
    }

    fn push(&self, entry: UrlResult) {
        let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        if document.results.is_empty() {
            document.results.push(PassResults::default());
        }
        if let Some(pass) = document.results.last_mut() {
            pass.urls.push(entry);
        }
    }
}

impl Reporter for JsonReporter {
    fn start(&self, options: &RunOptions) {
        let configuration = match serde_json::to_value(options) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Could not serialize run options: {e}");
                None
            }
        };
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .configuration = configuration;
    }

    fn start_pass(&self) {
        self.counters.reset();
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .results
            .push(PassResults::default());
    }

    fn log_test_result(&self, event: &TestEvent<'_>) {
        let passed = event.result.passed;
        self.counters.increment(if passed {
            Outcome::Success
        } else {
            Outcome::Failure
        });
        if passed && self.verbosity < 3 {
            return;
        }

        let mut entry = UrlResult {
            url: event.url.to_string(),
            platform: Some(event.platform.name.clone()),
            passed: Some(passed),
            ..Default::default()
        };
        if self.verbosity >= 3 {
            entry.expected_result = Some(event.assertion.description());
            entry.returned_result = Some(event.result.description.clone());
            entry.hops = Some(hops(event.response, event.follow_redirects));
            entry.time_secs = Some(event.response.elapsed.as_secs_f64());
        }
        if self.verbosity >= 4 {
            entry.request_headers = Some(header_pairs(&event.response.request_headers));
            entry.response_headers = Some(header_pairs(&event.response.headers));
            entry.body = Some(event.response.body.clone());
        }
        self.push(entry);
    }

    fn log_error(&self, url: &str, error: &dyn std::error::Error, platform: Option<&Platform>) {
        self.counters.increment(Outcome::Error);
        self.push(UrlResult {
            url: url.to_string(),
            platform: platform.map(|p| p.name.clone()),
            result: Some(error.to_string()),
            ..Default::default()
        });
    }

    fn end_pass(&self) {
        let summary = self.counters.summary();
        let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pass) = document.results.last_mut() {
            pass.summary = Some(summary);
        }
    }

    fn end(&self) -> std::io::Result<()> {
        let document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        let mut text = serde_json::to_string_pretty(&*document)?;
        text.push('\n');
        write_to(&self.sink, &text);
        Ok(())
    }
}
