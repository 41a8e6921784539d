//! In-memory reporter for embedding and tests.

use std::sync::{Mutex, PoisonError};

use crate::config::RunOptions;
use crate::platform::Platform;

use super::{Reporter, TestEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    PassStarted,
    Result {
        url: String,
        platform: String,
        assertion: String,
        passed: bool,
        description: String,
    },
    Error {
        url: String,
        platform: Option<String>,
        message: String,
    },
    PassEnded,
}

/// Keeps every event in order of arrival.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<RecordedEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(url, passed)` for every test result.
    pub fn results(&self) -> Vec<(String, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Result { url, passed, .. } => Some((url, passed)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Error { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn passes_started(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, RecordedEvent::PassStarted))
            .count()
    }

    fn record(&self, event: RecordedEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Reporter for CollectingReporter {
    fn start(&self, _options: &RunOptions) {}

    fn start_pass(&self) {
        self.record(RecordedEvent::PassStarted);
    }

    fn log_test_result(&self, event: &TestEvent<'_>) {
        self.record(RecordedEvent::Result {
            url: event.url.to_string(),
            platform: event.platform.name.clone(),
            assertion: event.assertion.description(),
            passed: event.result.passed,
            description: event.result.description.clone(),
        });
    }

    fn log_error(&self, url: &str, error: &dyn std::error::Error, platform: Option<&Platform>) {
        self.record(RecordedEvent::Error {
            url: url.to_string(),
            platform: platform.map(|p| p.name.clone()),
            message: error.to_string(),
        });
    }

    fn end_pass(&self) {
        self.record(RecordedEvent::PassEnded);
    }

    fn end(&self) -> std::io::Result<()> {
        Ok(())
    }
}
