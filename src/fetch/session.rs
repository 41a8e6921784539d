//! Per-directive fetch sessions.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use log::debug;
use reqwest::cookie::CookieStore;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error_handling::{FetchError, SessionError};
use crate::initialization::{init_session_client, SessionClient, TlsPolicy};

use super::Response;

/// Username and password sent with every request of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A form POST expected to leave the session holding cookies.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    /// Already transformed for the target environment.
    pub url: String,
    pub fields: Vec<(String, String)>,
}

/// Everything needed to open a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig<'a> {
    pub user_agent: &'a str,
    pub follow_redirects: bool,
    pub tls: &'a TlsPolicy,
    pub basic_auth: Option<&'a Credentials>,
    pub login: Option<&'a LoginForm>,
}

/// Cookies, credentials and a client, owned by one directive run.
pub enum Session {
    Live(LiveSession),
    /// Never touches the network; every fetch returns a synthetic response.
    DryRun,
}

pub struct LiveSession {
    client: SessionClient,
    user_agent: HeaderValue,
    basic_auth: Option<Credentials>,
    follow_redirects: bool,
}

impl Session {
    /// Opens an anonymous session: user agent and redirect policy only.
    pub fn anonymous(config: &SessionConfig<'_>) -> Result<Self, FetchError> {
        let client = init_session_client(config.user_agent, config.follow_redirects, config.tls)?;
        Ok(Session::Live(LiveSession {
            client,
            user_agent: HeaderValue::from_str(config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("smoketest")),
            basic_auth: None,
            follow_redirects: config.follow_redirects,
        }))
    }

    /// Opens a session with the configured basic auth and login applied.
    ///
    /// # Errors
    ///
    /// A failed login is returned as a `SessionError` naming the login URL.
    /// Callers are expected to report it and carry on with
    /// [`Session::anonymous`].
    pub async fn open(config: &SessionConfig<'_>) -> Result<Self, SessionError> {
        let mut session = Self::anonymous(config).map_err(|e| SessionError {
            url: config
                .login
                .map(|l| l.url.clone())
                .unwrap_or_default(),
            message: e.to_string(),
        })?;
        if let Session::Live(live) = &mut session {
            live.basic_auth = config.basic_auth.cloned();
            if let Some(login) = config.login {
                live.login(login).await?;
            }
        }
        Ok(session)
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Session::DryRun)
    }

    /// Fetches `url` with the extra `headers`, bounded by `timeout`.
    pub async fn fetch(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<Response, FetchError> {
        match self {
            Session::DryRun => Ok(Response::synthetic(url).with_request_headers(headers.clone())),
            Session::Live(live) => live.fetch(url, headers, timeout).await,
        }
    }
}

impl LiveSession {
    async fn login(&self, login: &LoginForm) -> Result<(), SessionError> {
        let session_error = |message: String| SessionError {
            url: login.url.clone(),
            message,
        };
        debug!("Logging in at {}", login.url);

        let mut request = self.client.client.post(&login.url).form(&login.fields);
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        request
            .send()
            .await
            .map_err(|e| session_error(FetchError::from(e).to_string()))?;

        let url = reqwest::Url::parse(&login.url).map_err(|e| session_error(e.to_string()))?;
        if self.client.cookies.cookies(&url).is_none() {
            return Err(session_error(format!(
                "Login attempt failed: {} set no cookies",
                login.url
            )));
        }
        Ok(())
    }

    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<Response, FetchError> {
        let mut request = self
            .client
            .client
            .get(url)
            .headers(headers.clone())
            .timeout(timeout);
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        let request = request.build()?;

        // The client adds its default User-Agent at send time.
        let mut request_headers = request.headers().clone();
        request_headers
            .entry(USER_AGENT)
            .or_insert_with(|| self.user_agent.clone());

        self.client.hops.store(0, Ordering::SeqCst);
        let started = Instant::now();
        let response = self.client.client.execute(request).await?;
        let elapsed = started.elapsed();

        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let final_url = response.url().to_string();
        let body = response.text().await?;
        debug!("Fetched {url}: {status} in {elapsed:?}");

        let mut fetched = Response::new(status, final_url)
            .with_headers(response_headers)
            .with_request_headers(request_headers)
            .with_body(body)
            .with_elapsed(elapsed);
        fetched.hops = if self.follow_redirects {
            self.client.hops.load(Ordering::SeqCst)
        } else {
            usize::from(fetched.is_redirect())
        };
        Ok(fetched)
    }
}
