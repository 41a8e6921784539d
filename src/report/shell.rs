//! Human-readable terminal reporter.
//!
//! | verbosity | success            | failure                            |
//! |-----------|--------------------|------------------------------------|
//! | 0 / quiet | nothing            | `[FAILED: url]`                    |
//! | 1         | `.`                | `[FAILED: url]`                    |
//! | 2         | `.`                | url, test, result, passed, platform|
//! | 3         | detail + time/hops | detail + time/hops                 |
//! | 4+        | adds headers, body | adds headers, body                 |

use colored::{Color, Colorize};
use log::info;

use crate::config::RunOptions;
use crate::platform::Platform;

use super::{
    header_pairs, hops, write_to, Outcome, PassCounters, ReportSink, Reporter, TestEvent,
};

pub struct ShellReporter {
    sink: ReportSink,
    verbosity: u8,
    quiet: bool,
    color: bool,
    counters: PassCounters,
}

impl ShellReporter {
    /// `color` should be false when writing to a file.
    pub fn new(sink: ReportSink, verbosity: u8, quiet: bool, color: bool) -> Self {
        Self {
            sink,
            verbosity,
            quiet,
            color,
            counters: PassCounters::new(),
        }
    }

    fn effective_verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbosity
        }
    }

    fn write_colored(&self, text: &str, color: Color) {
        if self.color {
            write_to(&self.sink, &text.color(color).bold().to_string());
        } else {
            write_to(&self.sink, text);
        }
    }

    fn detail(&self, event: &TestEvent<'_>, verbosity: u8) -> String {
        let mut lines = vec![
            String::new(),
            format!("url: {}", event.url),
            format!("test: {}", event.assertion.description()),
            format!("result: {}", event.result.description),
            format!("passed: {}", event.result.passed),
        ];
        if verbosity >= 3 {
            lines.push(format!(
                "time: {:.3}s",
                event.response.elapsed.as_secs_f64()
            ));
        }
        lines.push(format!("platform: {}", event.platform.name));
        if verbosity >= 3 {
            lines.push(format!(
                "hops: {}",
                hops(event.response, event.follow_redirects)
            ));
        }
        if verbosity >= 4 {
            lines.push(format!(
                "request headers: {}",
                format_headers(&header_pairs(&event.response.request_headers))
            ));
            lines.push(format!(
                "response headers: {}",
                format_headers(&header_pairs(&event.response.headers))
            ));
            lines.push(format!("body: {}", event.response.body));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

fn format_headers(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("\n    {name}: {value}"))
        .collect()
}

impl Reporter for ShellReporter {
    fn start(&self, options: &RunOptions) {
        info!(
            "Checking {} on level {} with {} worker(s)",
            options.input_filenames.join(", "),
            options.level,
            options.threads
        );
    }

    fn start_pass(&self) {
        self.counters.reset();
    }

    fn log_test_result(&self, event: &TestEvent<'_>) {
        let verbosity = self.effective_verbosity();
        if event.result.passed {
            self.counters.increment(Outcome::Success);
            let message = match verbosity {
                0 => return,
                1 | 2 => ".".to_string(),
                v => self.detail(event, v),
            };
            self.write_colored(&message, Color::Green);
        } else {
            self.counters.increment(Outcome::Failure);
            let message = match verbosity {
                0 | 1 => format!("\n[FAILED: {}]\n", event.url),
                v => self.detail(event, v),
            };
            self.write_colored(&message, Color::Red);
        }
    }

    fn log_error(&self, url: &str, error: &dyn std::error::Error, platform: Option<&Platform>) {
        self.counters.increment(Outcome::Error);
        let on = platform
            .map(|p| format!(" on {}", p.name))
            .unwrap_or_default();
        self.write_colored(&format!("\n[ERRORED{on}: {url} {error}]\n"), Color::Red);
    }

    fn end_pass(&self) {
        let summary = self.counters.summary();
        let text = [
            String::new(),
            format!("Elapsed time: {:.3}", summary.elapsed_secs),
            format!("Number of successes: {}", summary.successes),
            format!("Number of failures: {}", summary.failures),
            format!("Number of errors: {}", summary.errors),
            String::new(),
        ]
        .join("\n");
        write_to(&self.sink, &text);
    }

    fn end(&self) -> std::io::Result<()> {
        write_to(&self.sink, "\n");
        Ok(())
    }
}
