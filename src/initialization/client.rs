//! HTTP client initialization.
//!
//! Every directive run gets its own client so that cookies from one
//! directive's login never leak into another's requests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Certificate, ClientBuilder};

use crate::config::{Settings, MAX_REDIRECT_HOPS};
use crate::error_handling::InitializationError;

/// How server certificates are checked.
///
/// Smoke tests routinely target dev and staging hosts with self-signed
/// certificates, so verification is off unless the settings file names a
/// CA bundle.
#[derive(Debug, Clone, Default)]
pub enum TlsPolicy {
    #[default]
    AcceptInvalid,
    Verify(Vec<Certificate>),
}

impl TlsPolicy {
    /// Builds the policy from `ca_path` in the settings file.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::CertificateError` if the bundle can't be
    /// read or holds no usable PEM certificates.
    pub fn from_settings(settings: &Settings) -> Result<Self, InitializationError> {
        match &settings.ca_path {
            Some(path) => Self::from_ca_bundle(path),
            None => Ok(Self::AcceptInvalid),
        }
    }

    pub fn from_ca_bundle(path: &Path) -> Result<Self, InitializationError> {
        let certificate_error = |message: String| InitializationError::CertificateError {
            path: path.display().to_string(),
            message,
        };
        let pem = std::fs::read(path).map_err(|e| certificate_error(e.to_string()))?;
        let certificates =
            Certificate::from_pem_bundle(&pem).map_err(|e| certificate_error(e.to_string()))?;
        if certificates.is_empty() {
            return Err(certificate_error("no certificates found".to_string()));
        }
        Ok(Self::Verify(certificates))
    }

    fn apply(&self, mut builder: ClientBuilder) -> ClientBuilder {
        match self {
            TlsPolicy::AcceptInvalid => builder.danger_accept_invalid_certs(true),
            TlsPolicy::Verify(certificates) => {
                for certificate in certificates {
                    builder = builder.add_root_certificate(certificate.clone());
                }
                builder
            }
        }
    }
}

/// A client plus the state it shares with its redirect policy and cookie
/// store.
#[derive(Debug, Clone)]
pub struct SessionClient {
    pub client: reqwest::Client,
    pub cookies: Arc<Jar>,
    /// Hops followed by the most recent request; reset before each one.
    pub hops: Arc<AtomicUsize>,
}

/// Initializes a client for one directive run.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header
/// - Its own cookie jar
/// - Redirects disabled, or followed up to `MAX_REDIRECT_HOPS` while
///   counting hops
/// - The TLS policy from the settings file
///
/// Timeouts are set per request, since they come from the directive.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_session_client(
    user_agent: &str,
    follow_redirects: bool,
    tls: &TlsPolicy,
) -> Result<SessionClient, reqwest::Error> {
    let cookies = Arc::new(Jar::default());
    let hops = Arc::new(AtomicUsize::new(0));

    let redirect_policy = if follow_redirects {
        let counter = Arc::clone(&hops);
        Policy::custom(move |attempt| {
            let followed = attempt.previous().len();
            if followed > MAX_REDIRECT_HOPS {
                attempt.error(format!("too many redirects (more than {MAX_REDIRECT_HOPS})"))
            } else {
                counter.store(followed, Ordering::SeqCst);
                attempt.follow()
            }
        })
    } else {
        Policy::none()
    };

    let builder = ClientBuilder::new()
        .user_agent(user_agent)
        .cookie_provider(Arc::clone(&cookies))
        .redirect(redirect_policy);
    let client = tls.apply(builder).build()?;

    Ok(SessionClient {
        client,
        cookies,
        hops,
    })
}

/// Initializes the client used to download remote sitemaps.
///
/// Sitemaps are fetched once, before any directive runs, following
/// redirects the usual way.
pub fn init_sitemap_client(
    user_agent: &str,
    tls: &TlsPolicy,
) -> Result<reqwest::Client, reqwest::Error> {
    let builder = ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(crate::config::DEFAULT_REQUEST_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECT_HOPS));
    tls.apply(builder).build()
}
