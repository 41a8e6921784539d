//! Test-result reporting.
//!
//! Directives report every assertion outcome and every transport error to a
//! [`Reporter`] shared by all workers. Reporters must tolerate concurrent
//! calls: counters are atomics and output goes through a mutex-guarded
//! writer.
//!
//! The reporter is chosen once at startup from [`ReportFormat`] and passed
//! down explicitly.

mod collecting;
mod json;
mod shell;

pub use collecting::{CollectingReporter, RecordedEvent};
pub use json::JsonReporter;
pub use shell::ShellReporter;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use reqwest::header::HeaderMap;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::assertion::{Assertion, TestResult};
use crate::config::{ReportFormat, RunOptions};
use crate::fetch::Response;
use crate::platform::Platform;

/// One assertion evaluated against one response.
pub struct TestEvent<'a> {
    pub url: &'a str,
    pub assertion: &'a Assertion,
    pub result: &'a TestResult,
    pub response: &'a Response,
    pub platform: &'a Platform,
    pub follow_redirects: bool,
}

/// Consumer of run, pass and test events.
pub trait Reporter: Send + Sync {
    /// Called once before the first pass.
    fn start(&self, options: &RunOptions);

    fn start_pass(&self);

    fn log_test_result(&self, event: &TestEvent<'_>);

    /// A URL that produced no response, or a failed login. `platform` is
    /// `None` for errors not tied to one platform.
    fn log_error(&self, url: &str, error: &dyn std::error::Error, platform: Option<&Platform>);

    fn end_pass(&self);

    /// Called once after the last pass, including cancelled runs.
    fn end(&self) -> io::Result<()>;
}

/// Kinds of event counted per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Outcome {
    Success,
    Failure,
    Error,
}

/// Counts of one pass, as reported at its end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub elapsed_secs: f64,
    pub successes: usize,
    pub failures: usize,
    pub errors: usize,
}

/// Thread-safe per-pass counters.
pub struct PassCounters {
    counts: HashMap<Outcome, AtomicUsize>,
    started: Mutex<Instant>,
}

impl Default for PassCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl PassCounters {
    pub fn new() -> Self {
        let counts = Outcome::iter().map(|o| (o, AtomicUsize::new(0))).collect();
        Self {
            counts,
            started: Mutex::new(Instant::now()),
        }
    }

    /// Zeroes the counters and restarts the pass clock.
    pub fn reset(&self) {
        for counter in self.counts.values() {
            counter.store(0, Ordering::SeqCst);
        }
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn increment(&self, outcome: Outcome) {
        if let Some(counter) = self.counts.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, outcome: Outcome) -> usize {
        self.counts
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn summary(&self) -> PassSummary {
        let started = *self.started.lock().unwrap_or_else(PoisonError::into_inner);
        PassSummary {
            elapsed_secs: started.elapsed().as_secs_f64(),
            successes: self.get(Outcome::Success),
            failures: self.get(Outcome::Failure),
            errors: self.get(Outcome::Error),
        }
    }
}

/// Destination of a reporter's output.
pub type ReportSink = Mutex<Box<dyn Write + Send>>;

fn open_sink(options: &RunOptions) -> io::Result<ReportSink> {
    let writer: Box<dyn Write + Send> = match &options.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    Ok(Mutex::new(writer))
}

/// Builds the reporter selected by `options.format`, writing to stdout or
/// `options.output`.
pub fn build_reporter(options: &RunOptions) -> io::Result<Arc<dyn Reporter>> {
    let sink = open_sink(options)?;
    let reporter: Arc<dyn Reporter> = match options.format {
        ReportFormat::Shell => Arc::new(ShellReporter::new(
            sink,
            options.verbosity,
            options.quiet,
            options.output.is_none(),
        )),
        ReportFormat::Json => Arc::new(JsonReporter::new(sink, options.verbosity)),
    };
    Ok(reporter)
}

/// Redirect hops for reporting: an unfollowed redirect is one hop.
pub fn hops(response: &Response, follow_redirects: bool) -> usize {
    if !follow_redirects && response.is_redirect() {
        1
    } else {
        response.hops
    }
}

/// `name: value` pairs of `headers`, values decoded lossily.
pub fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn write_to(sink: &ReportSink, text: &str) {
    let mut out = sink.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        log::warn!("Failed to write report output: {e}");
    }
}
