//! Directives: the unit of scheduled work.
//!
//! A [`Directive`] is one or more URLs, each fetched once per platform and
//! evaluated against a fixed list of assertions. After a run, `urls` holds
//! only the URLs that failed, so the next pass re-checks just those.

mod builder;
pub mod record;

pub use builder::DirectiveBuilder;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::assertion::{Assertion, TestResult};
use crate::fetch::{Credentials, LoginForm, Session, SessionConfig};
use crate::initialization::TlsPolicy;
use crate::platform::Platform;
use crate::report::{Reporter, TestEvent};

/// Shared, read-only state every directive run needs.
pub struct RunContext {
    pub dry_run: bool,
    pub user_agent: String,
    pub tls: TlsPolicy,
    pub reporter: Arc<dyn Reporter>,
}

#[derive(Debug)]
pub struct Directive {
    pub urls: Vec<String>,
    pub tests: Vec<Assertion>,
    pub platforms: Vec<Platform>,
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub basic_auth: Option<Credentials>,
    pub login: Option<LoginForm>,
    /// Set by the most recent run only.
    pub failed: bool,
}

impl Directive {
    /// Checks every URL on every platform, reporting each outcome.
    ///
    /// Transport errors and failed logins are reported and recovered here;
    /// nothing escapes to the caller.
    pub async fn run(&mut self, ctx: &RunContext) {
        let mut failed_urls: Vec<String> = Vec::new();
        let mut mark_failed = |url: &str| {
            if !failed_urls.iter().any(|u| u == url) {
                failed_urls.push(url.to_string());
            }
        };

        match self.open_session(ctx).await {
            Some(session) => {
                for platform in &self.platforms {
                    for url in &self.urls {
                        if !self.check_url(&session, url, platform, ctx).await {
                            mark_failed(url);
                        }
                    }
                }
            }
            None => self.urls.iter().for_each(|url| mark_failed(url)),
        }

        self.failed = !failed_urls.is_empty();
        self.urls = failed_urls;
    }

    fn session_config<'a>(&'a self, ctx: &'a RunContext) -> SessionConfig<'a> {
        SessionConfig {
            user_agent: &ctx.user_agent,
            follow_redirects: self.follow_redirects,
            tls: &ctx.tls,
            basic_auth: self.basic_auth.as_ref(),
            login: self.login.as_ref(),
        }
    }

    /// Opens the run's session, downgrading to an anonymous one when the
    /// login fails. `None` when no HTTP client could be built; every URL
    /// has been reported as errored in that case.
    async fn open_session(&self, ctx: &RunContext) -> Option<Session> {
        if ctx.dry_run {
            return Some(Session::DryRun);
        }
        let config = self.session_config(ctx);
        let login_error = match Session::open(&config).await {
            Ok(session) => return Some(session),
            Err(e) => e,
        };

        match Session::anonymous(&config) {
            Ok(session) => {
                warn!("{login_error}; continuing without login");
                ctx.reporter.log_error(&login_error.url, &login_error, None);
                Some(session)
            }
            Err(e) => {
                warn!("Could not build HTTP client: {e}");
                for platform in &self.platforms {
                    for url in &self.urls {
                        ctx.reporter.log_error(url, &e, Some(platform));
                    }
                }
                None
            }
        }
    }

    /// Fetches one URL and evaluates every assertion. Returns whether all
    /// of them passed.
    async fn check_url(
        &self,
        session: &Session,
        url: &str,
        platform: &Platform,
        ctx: &RunContext,
    ) -> bool {
        let response = match session.fetch(url, &platform.headers, self.timeout).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Fetching {url} on {} failed: {e}", platform.name);
                ctx.reporter.log_error(url, &e, Some(platform));
                return false;
            }
        };

        let mut all_passed = true;
        for test in &self.tests {
            let result = if session.is_dry_run() {
                TestResult::dry_run()
            } else {
                test.evaluate(&response)
            };
            debug!(
                "{url} [{}] {}: {}",
                platform.name,
                test.kind(),
                result.description
            );
            ctx.reporter.log_test_result(&TestEvent {
                url,
                assertion: test,
                result: &result,
                response: &response,
                platform,
                follow_redirects: self.follow_redirects,
            });
            all_passed &= result.passed;
        }
        all_passed
    }
}
