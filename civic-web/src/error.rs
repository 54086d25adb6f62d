//! Error types for the civic-web crate.
//!
//! Messages are stable strings suitable for logs; the query text never
//! appears in them.

/// Errors that can occur while querying the open web.
#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    /// The HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with a rate-limit or bot-detection page.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The response HTML could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid transport configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for civic-web results.
pub type Result<T> = std::result::Result<T, WebSearchError>;
