// Shared test helpers for building directives and run contexts.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::sync::Arc;
use std::time::Duration;

use smoketest::config::RunOptions;
use smoketest::directive::record::CheckRecord;
use smoketest::initialization::TlsPolicy;
use smoketest::platform::PlatformRegistry;
use smoketest::report::CollectingReporter;
use smoketest::{Directive, DirectiveBuilder, RunContext, UrlTransformer};

/// Run options for tests: live level, no cachebusting, so mock servers see
/// exactly the URLs the tests wrote.
pub fn test_options() -> RunOptions {
    RunOptions {
        cachebust: false,
        user_agent: "smoketest-test".to_string(),
        ..Default::default()
    }
}

/// Builds a directive from a JSON check record with the test options.
pub fn build_directive(record: serde_json::Value) -> Directive {
    let options = test_options();
    let transformer = UrlTransformer::default();
    let registry = PlatformRegistry::default();
    let record = CheckRecord::from_value(record).expect("record should parse");
    DirectiveBuilder::new(&options, &transformer, &registry, Duration::from_secs(5))
        .build(&record)
        .expect("directive should build")
}

/// A run context reporting into `reporter`.
#[allow(dead_code)] // Used by other test files
pub fn test_context(reporter: &Arc<CollectingReporter>, dry_run: bool) -> Arc<RunContext> {
    Arc::new(RunContext {
        dry_run,
        user_agent: "smoketest-test".to_string(),
        tls: TlsPolicy::default(),
        reporter: Arc::clone(reporter) as Arc<dyn smoketest::Reporter>,
    })
}
