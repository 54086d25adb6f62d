//! LLM content-quality prompt and response parsing.

use crate::types::SearchResultItem;

/// Longest snippet forwarded to the model, in characters.
const MAX_SNIPPET_CHARS: usize = 1_500;

const PROMPT_HEADER: &str = "You are evaluating a web search result that will be used to answer \
a citizen's question about local government. Rate it and answer with ONLY a JSON object of the \
form {\"quality\": <0..1>, \"factual_accuracy\": <0..1>, \"bias\": <0..1>} where quality is \
how informative and well-sourced the text is, factual_accuracy is how likely its factual \
statements are correct, and bias is how one-sided or emotionally loaded it is (0 = neutral).";

/// Parsed model judgement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityEstimate {
    /// Informativeness, `[0, 1]`.
    pub content_quality: f64,
    /// Likelihood the factual statements are correct, when the model gave one.
    pub factual_accuracy: Option<f64>,
    /// One-sidedness, when the model gave one.
    pub bias_level: Option<f64>,
}

/// Build the fixed evaluation prompt for `item`.
pub fn build_prompt(item: &SearchResultItem) -> String {
    let snippet: String = item.content.chars().take(MAX_SNIPPET_CHARS).collect();
    format!(
        "{PROMPT_HEADER}\n\nTitle: {}\nURL: {}\nText: {}\n",
        item.title,
        item.url.as_deref().unwrap_or("(none)"),
        snippet
    )
}

/// Parse a model reply into a [`QualityEstimate`].
///
/// Accepts the first `{...}` object in the reply (models like to wrap JSON
/// in prose or code fences) or a bare number. Scores on a 0–10 scale are
/// rescaled. Returns `None` when no usable quality value is present.
pub fn parse_quality_response(reply: &str) -> Option<QualityEstimate> {
    if let Some(value) = first_json_object(reply) {
        let quality = number(&value, &["quality", "content_quality"])?;
        return Some(QualityEstimate {
            content_quality: quality,
            factual_accuracy: number(&value, &["factual_accuracy", "accuracy"]),
            bias_level: number(&value, &["bias", "bias_level"]),
        });
    }
    let bare = reply.trim().parse::<f64>().ok()?;
    Some(QualityEstimate {
        content_quality: rescale(bare)?,
        factual_accuracy: None,
        bias_level: None,
    })
}

fn first_json_object(reply: &str) -> Option<serde_json::Value> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<serde_json::Value>(&reply[start..=end])
        .ok()
        .filter(serde_json::Value::is_object)
}

fn number(value: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|k| value.get(*k))
        .and_then(serde_json::Value::as_f64)
        .and_then(rescale)
}

fn rescale(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    if raw <= 1.0 {
        Some(raw)
    } else if raw <= 10.0 {
        Some(raw / 10.0)
    } else {
        None
    }
}
