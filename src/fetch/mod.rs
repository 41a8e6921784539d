//! HTTP fetching.
//!
//! A [`Session`] is opened for each directive run and owns that run's
//! cookies and credentials. Fetches produce a [`Response`] that assertions
//! evaluate, or a [`FetchError`](crate::error_handling::FetchError) that the
//! directive reports against the URL.

mod response;
mod session;

pub use response::Response;
pub use session::{Credentials, LoginForm, Session, SessionConfig};
