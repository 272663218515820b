//! Error types for the shopsift-search crate.
//!
//! All errors use stable string messages suitable for logs and programmatic
//! handling. No API keys, raw capability payloads, or query text appear in
//! error messages.

/// Errors that can occur while answering a product search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An external capability failed or returned a payload that does not
    /// match the expected shape.
    #[error("adapter error: {0}")]
    Adapter(String),

    /// A single platform's product search failed.
    #[error("source error: {0}")]
    Source(String),

    /// An operation exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// An HTTP request to an external service failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The caller supplied a query that cannot be searched.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Any failure outside the recoverable categories.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for shopsift-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
