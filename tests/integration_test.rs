//! Integration tests for the smoketest application.
//!
//! These tests drive `run_smoketest()` end to end against a mock HTTP server:
//! input files on disk, a JSON report written to a temp file, and the
//! resulting `RunReport`. They make no real network requests.

use std::fs;
use std::time::Duration;

use serde_json::Value;
use smoketest::{run_smoketest, ReportFormat, RunOptions, Settings};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options_for(dir: &TempDir, input: &str) -> RunOptions {
    RunOptions {
        input_filenames: vec![dir.path().join(input).to_string_lossy().into_owned()],
        cachebust: false,
        user_agent: "smoketest-integration".to_string(),
        threads: 2,
        format: ReportFormat::Json,
        output: Some(dir.path().join("report.json")),
        ..Default::default()
    }
}

fn read_report(dir: &TempDir) -> Value {
    let text = fs::read_to_string(dir.path().join("report.json")).expect("report written");
    serde_json::from_str(&text).expect("report is JSON")
}

#[tokio::test]
async fn test_passing_suite_writes_json_report() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .and(header("user-agent", "smoketest-integration"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><head><title>Home</title></head></html>"),
        )
        .mount(&server)
        .await;
    Mock::given(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "ok"}"#))
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("checks.yaml"),
        format!(
            r#"
- directive: check
  url: {base}/
  html:
    - selector: title
      equals: Home
- directive: check
  url: {base}/api/status
  json:
    - selector: status
      equals: ok
"#,
            base = server.uri()
        ),
    )
    .expect("write suite");

    let mut options = options_for(&dir, "checks.yaml");
    options.verbosity = 3;
    let report = run_smoketest(options, &Settings::default(), &CancellationToken::new())
        .await
        .expect("run completes");

    assert!(report.success);
    assert!(!report.cancelled);
    assert_eq!(report.passes, 1);
    assert_eq!(report.remaining_failures, 0);

    let document = read_report(&dir);
    assert_eq!(document["configuration"]["format"], "json");
    let passes = document["results"].as_array().expect("results list");
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0]["summary"]["successes"], 4);
    assert_eq!(passes[0]["summary"]["failures"], 0);
    assert_eq!(passes[0]["urls"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_failing_suite_reruns_and_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(path("/fine"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("urls.txt"),
        format!("{base}/fine\n{base}/missing\n", base = server.uri()),
    )
    .expect("write list");

    let mut options = options_for(&dir, "urls.txt");
    options.passes = 2;
    options.delay_between_passes = Duration::ZERO;
    let report = run_smoketest(options, &Settings::default(), &CancellationToken::new())
        .await
        .expect("run completes");

    assert!(!report.success);
    assert_eq!(report.passes, 2);
    assert_eq!(report.remaining_failures, 1);

    let document = read_report(&dir);
    let passes = document["results"].as_array().expect("results list");
    assert_eq!(passes.len(), 2);
    // Verbosity 0 records failures only.
    let second = passes[1]["urls"].as_array().expect("urls list");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0]["url"], format!("{}/missing", server.uri()));
    assert_eq!(second[0]["passed"], false);
}

#[tokio::test]
async fn test_dry_run_against_unreachable_hosts_succeeds() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("urls.txt"),
        "http://127.0.0.1:1/\n404 http://127.0.0.1:1/gone\n",
    )
    .expect("write list");

    let mut options = options_for(&dir, "urls.txt");
    options.dry_run = true;
    let report = run_smoketest(options, &Settings::default(), &CancellationToken::new())
        .await
        .expect("run completes");

    assert!(report.success);
}

#[tokio::test]
async fn test_invalid_input_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("checks.json"),
        format!(
            r#"[{{"directive": "check", "url": "{}/"}}, {{"directive": "check"}}]"#,
            server.uri()
        ),
    )
    .expect("write suite");

    let err = run_smoketest(
        options_for(&dir, "checks.json"),
        &Settings::default(),
        &CancellationToken::new(),
    )
    .await
    .expect_err("missing url is fatal");
    assert!(format!("{err:#}").contains("checks.json"));
    assert!(!dir.path().join("report.json").exists());
}

#[tokio::test]
async fn test_cancelled_run_is_not_a_success() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("urls.txt"), "http://127.0.0.1:1/\n").expect("write list");

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let report = run_smoketest(options_for(&dir, "urls.txt"), &Settings::default(), &shutdown)
        .await
        .expect("run completes");

    assert!(report.cancelled);
    assert!(!report.success);
    assert_eq!(report.passes, 0);
    assert_eq!(report.remaining_failures, 1);
}
