//! Transport configuration with polite scraping defaults.

use serde::{Deserialize, Serialize};

use crate::error::WebSearchError;

/// Default HTML endpoint queried by [`crate::WebSearchClient`].
pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Configuration for the open-web transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    /// Maximum number of hits returned per query.
    pub max_results: usize,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Ask the endpoint to filter adult content.
    pub safe_search: bool,
    /// Random delay range in milliseconds `(min, max)` applied before each
    /// request, spreading bursts of cascade queries over time.
    pub request_delay_ms: (u64, u64),
    /// Custom User-Agent. `None` rotates through built-in browser strings.
    pub user_agent: Option<String>,
    /// Region/language hint sent as `kl` (e.g. `pl-pl`).
    pub region: Option<String>,
    /// Endpoint override, used by tests and self-hosted mirrors.
    pub endpoint: String,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            timeout_seconds: 8,
            safe_search: true,
            request_delay_ms: (100, 400),
            user_agent: None,
            region: Some("pl-pl".into()),
            endpoint: DEFAULT_ENDPOINT.into(),
        }
    }
}

impl WebSearchConfig {
    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WebSearchError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), WebSearchError> {
        if self.max_results == 0 {
            return Err(WebSearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(WebSearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(WebSearchError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        if url::Url::parse(&self.endpoint).is_err() {
            return Err(WebSearchError::Config(format!(
                "endpoint is not a valid URL: {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}
