//! # civic-web
//!
//! Open-web search transport for the civic search cascade.
//!
//! Scrapes the DuckDuckGo HTML endpoint directly: no API keys, no
//! external services. The cascade treats this crate as a leaf source: it
//! returns raw [`WebHit`] values and leaves credibility, ranking and
//! deduplication to `civic-search`.
//!
//! ## Security
//!
//! - No API keys or secrets to leak
//! - Queries are logged only at trace level
//! - Snippets are whitespace-collapsed and stripped of control characters

pub mod config;
pub mod duckduckgo;
pub mod error;
pub mod http;
pub mod types;

pub use config::WebSearchConfig;
pub use duckduckgo::WebSearchClient;
pub use error::{Result, WebSearchError};
pub use types::WebHit;

/// Search the open web with a one-off client.
///
/// Prefer holding a [`WebSearchClient`] when issuing many queries so the
/// underlying HTTP connection pool is reused.
///
/// # Errors
///
/// Returns [`WebSearchError::Config`] for an invalid configuration, or
/// the transport/parse error of the underlying request.
pub async fn search(query: &str, config: &WebSearchConfig) -> Result<Vec<WebHit>> {
    let client = WebSearchClient::new(config.clone())?;
    client.search(query).await
}
