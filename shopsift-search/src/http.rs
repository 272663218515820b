//! Shared HTTP client construction for outbound service calls.

use std::time::Duration;

use crate::error::SearchError;

/// User-Agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("shopsift/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] for calls to external services.
///
/// The client has:
/// - an overall request timeout of `timeout`
/// - a fixed shopsift User-Agent
/// - gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .gzip(true)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}
