//! Error types for the search cascade.
//!
//! Two tiers: [`CascadeError`] for failures the caller must handle
//! (configuration, LLM transport, I/O) and [`SourceError`] for failures
//! scoped to a single source. Source errors are recorded in the cascade
//! response and never escape [`crate::SearchCascadeEngine::search`].

/// Top-level error type for the civic search core.
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Language model request failed or returned an unusable body.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Failed to (de)serialize a document or response.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CascadeError>;

/// Failure of a single source invocation.
///
/// Always source-local: the cascade records it against the source and
/// carries on with the remaining sources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source did not answer within its configured timeout.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Network or HTTP-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The source answered with a body that could not be interpreted.
    #[error("malformed response: {0}")]
    Parse(String),

    /// The source is not registered, disabled, or refused the request.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The circuit breaker is open for this source.
    #[error("circuit open after {0} consecutive failures")]
    CircuitOpen(u32),
}

impl From<civic_web::WebSearchError> for SourceError {
    fn from(err: civic_web::WebSearchError) -> Self {
        match err {
            civic_web::WebSearchError::Http(msg) => Self::Http(msg),
            civic_web::WebSearchError::RateLimited(msg) => {
                Self::Unavailable(format!("rate limited: {msg}"))
            }
            civic_web::WebSearchError::Parse(msg) => Self::Parse(msg),
            civic_web::WebSearchError::Config(msg) => Self::Unavailable(msg),
        }
    }
}
