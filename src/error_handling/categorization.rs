//! Transport error categorization.

use super::types::FetchErrorKind;

/// Categorizes a `reqwest::Error` into a `FetchErrorKind`.
///
/// Timeouts are checked first: reqwest reports a connect timeout as both
/// `is_connect()` and `is_timeout()`, and operators care about the latter.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> FetchErrorKind {
    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_connect() {
        FetchErrorKind::Connect
    } else if error.is_redirect() {
        FetchErrorKind::Redirect
    } else if error.is_body() || error.is_decode() {
        FetchErrorKind::Body
    } else if error.is_request() || error.is_builder() {
        FetchErrorKind::Request
    } else {
        FetchErrorKind::Other
    }
}
