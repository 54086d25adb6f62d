//! LLM client boundary.
//!
//! The cascade only ever needs `complete(prompt) -> text`. [`LlmClient`]
//! is that seam; [`OpenAiCompatibleClient`] implements it against any
//! OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CascadeError;

/// Single-shot text completion.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete `prompt` and return the model's text.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Llm`] on transport failure or an unusable body.
    async fn complete(&self, prompt: &str) -> Result<String, CascadeError>;
}

/// Connection settings for [`OpenAiCompatibleClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmEndpointConfig {
    /// Base URL without the `/v1/...` suffix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Bearer token. Empty for local servers that need none.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for LlmEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            model: "local".into(),
            api_key: String::new(),
            timeout_seconds: 20,
            max_tokens: 256,
        }
    }
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiCompatibleClient {
    config: LlmEndpointConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl OpenAiCompatibleClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: LlmEndpointConfig) -> Result<Self, CascadeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CascadeError::Llm(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn map_http_error(status: reqwest::StatusCode, body: &str) -> CascadeError {
        let message = extract_error_message(body);
        match status.as_u16() {
            401 => CascadeError::Llm(format!("authentication failed: {message}")),
            429 => CascadeError::Llm(format!("rate limited: {message}")),
            code => CascadeError::Llm(format!("HTTP {code}: {message}")),
        }
    }
}

/// Pull `error.message` out of an error body, else return the body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String, CascadeError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.config.max_tokens,
            "temperature": 0.0,
            "stream": false,
        });

        let mut request = self.client.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CascadeError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::map_http_error(status, &text));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CascadeError::Llm(format!("invalid JSON body: {e}")))?;

        parsed
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| CascadeError::Llm("response has no choices[0].message.content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_extracted_from_json() {
        let body = r#"{"error":{"message":"bad key","type":"auth"}}"#;
        assert_eq!(extract_error_message(body), "bad key");
        assert_eq!(extract_error_message("plain"), "plain");
    }

    #[test]
    fn http_errors_are_mapped() {
        let err = OpenAiCompatibleClient::map_http_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down"}}"#,
        );
        assert_eq!(err.to_string(), "LLM error: rate limited: slow down");

        let err = OpenAiCompatibleClient::map_http_error(reqwest::StatusCode::BAD_GATEWAY, "oops");
        assert_eq!(err.to_string(), "LLM error: HTTP 502: oops");
    }

    #[test]
    fn debug_hides_api_key() {
        let client = OpenAiCompatibleClient::new(LlmEndpointConfig {
            api_key: "sk-secret".into(),
            ..Default::default()
        })
        .expect("client");
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}
