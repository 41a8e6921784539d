//! Fetched response data shared by every assertion run against it.

use std::cell::OnceCell;
use std::time::Duration;

use reqwest::header::{HeaderMap, LOCATION};
use scraper::Html;

/// One fetched URL, as seen by assertions and reporters.
///
/// The parsed HTML document is computed on first use and kept alongside the
/// response, so several HTML assertions share one parse. `Html` isn't `Send`,
/// so a `Response` must be evaluated and dropped without crossing an await.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    /// Headers that were sent with the request (platform headers, user agent).
    pub request_headers: HeaderMap,
    pub body: String,
    /// Time until the response headers arrived.
    pub elapsed: Duration,
    /// URL of the final response after any followed redirects.
    pub final_url: String,
    /// Redirect hops taken, or 1 for an unfollowed redirect.
    pub hops: usize,
    html: OnceCell<Option<Html>>,
}

impl Response {
    pub fn new(status: u16, final_url: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            request_headers: HeaderMap::new(),
            body: String::new(),
            elapsed: Duration::ZERO,
            final_url: final_url.into(),
            hops: 0,
            html: OnceCell::new(),
        }
    }

    /// Stand-in for a real response in dry runs: 200, empty body, 1 ms.
    pub fn synthetic(url: &str) -> Self {
        Self::new(200, url).with_elapsed(Duration::from_millis(1))
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_request_headers(mut self, headers: HeaderMap) -> Self {
        self.request_headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.html = OnceCell::new();
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn with_hops(mut self, hops: usize) -> Self {
        self.hops = hops;
        self
    }

    /// Value of response header `name`, case-insensitively.
    ///
    /// Values that aren't valid UTF-8 are decoded lossily rather than
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }

    pub fn location(&self) -> Option<String> {
        self.header(LOCATION.as_str()).filter(|l| !l.is_empty())
    }

    /// A 3xx status with a `Location` header.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.location().is_some()
    }

    /// The body parsed as HTML, or `None` when there is nothing to parse.
    pub fn html(&self) -> Option<&Html> {
        self.html
            .get_or_init(|| {
                if self.body.trim().is_empty() {
                    None
                } else {
                    Some(Html::parse_document(&self.body))
                }
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_synthetic_response() {
        let response = Response::synthetic("http://www.example.com/");
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.elapsed, Duration::from_millis(1));
        assert_eq!(response.final_url, "http://www.example.com/");
    }

    #[test]
    fn test_is_redirect_needs_location() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/elsewhere"));
        assert!(Response::new(301, "http://a.example.com/")
            .with_headers(headers)
            .is_redirect());
        assert!(!Response::new(301, "http://a.example.com/").is_redirect());
        assert!(!Response::new(200, "http://a.example.com/").is_redirect());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert("x-cache", HeaderValue::from_static("HIT"));
        let response = Response::new(200, "http://a.example.com/").with_headers(headers);
        assert_eq!(response.header("X-Cache").as_deref(), Some("HIT"));
        assert_eq!(response.header("X-Missing"), None);
    }

    #[test]
    fn test_empty_body_has_no_document() {
        let response = Response::new(200, "http://a.example.com/").with_body("  \n");
        assert!(response.html().is_none());
    }

    #[test]
    fn test_document_is_parsed_once() {
        let response =
            Response::new(200, "http://a.example.com/").with_body("<p>hello</p>");
        let first = response.html().expect("document") as *const Html;
        let second = response.html().expect("document") as *const Html;
        assert_eq!(first, second);
    }
}
