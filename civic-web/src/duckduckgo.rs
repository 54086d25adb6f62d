//! DuckDuckGo HTML-endpoint client.
//!
//! Uses the JavaScript-free results page, which is tolerant of automated
//! requests and carries the destination URL inside a `uddg` redirect
//! parameter.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::WebSearchConfig;
use crate::error::WebSearchError;
use crate::http;
use crate::types::WebHit;

/// Marker present on DuckDuckGo's bot-challenge page.
const CHALLENGE_MARKER: &str = "anomaly-modal";

/// Reusable open-web search client.
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    config: WebSearchConfig,
    client: reqwest::Client,
}

impl WebSearchClient {
    /// Build a client after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`WebSearchError::Config`] for invalid configuration or
    /// [`WebSearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: WebSearchConfig) -> Result<Self, WebSearchError> {
        config.validate()?;
        let client = http::build_client(&config)?;
        Ok(Self { config, client })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &WebSearchConfig {
        &self.config
    }

    /// Run one query against the results endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`WebSearchError::RateLimited`] when the endpoint answers
    /// with a challenge page or HTTP 429/403, [`WebSearchError::Http`] for
    /// other transport failures and [`WebSearchError::Parse`] when the page
    /// cannot be parsed.
    pub async fn search(&self, query: &str) -> Result<Vec<WebHit>, WebSearchError> {
        tracing::trace!(query, "open-web search");

        let delay = http::jitter(self.config.request_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut form = vec![("q", query.to_string())];
        if self.config.safe_search {
            form.push(("kp", "1".to_string()));
        }
        if let Some(region) = &self.config.region {
            form.push(("kl", region.clone()));
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .form(&form)
            .header("Accept-Language", "pl-PL,pl;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(|e| WebSearchError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 403 {
            return Err(WebSearchError::RateLimited(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(WebSearchError::Http(format!("HTTP {}", status.as_u16())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| WebSearchError::Http(format!("response read failed: {e}")))?;

        if html.contains(CHALLENGE_MARKER) {
            return Err(WebSearchError::RateLimited("challenge page served".into()));
        }

        tracing::trace!(bytes = html.len(), "results page received");
        parse_results_page(&html, self.config.max_results)
    }
}

/// Parse a results page into [`WebHit`]s, skipping ads.
///
/// # Errors
///
/// Returns [`WebSearchError::Parse`] if a built-in selector fails to compile.
pub fn parse_results_page(html: &str, max_results: usize) -> Result<Vec<WebHit>, WebSearchError> {
    let document = Html::parse_document(html);

    let result_sel = selector(".result:not(.result--ad), .web-result:not(.result--ad)")?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;
    let extras_sel = selector(".result__extras__url span, .result__timestamp")?;

    let mut hits: Vec<WebHit> = Vec::new();

    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };
        let title = sanitise(&title_el.text().collect::<String>());
        if title.is_empty() {
            continue;
        }
        let Some(url) = title_el.value().attr("href").and_then(unwrap_redirect) else {
            continue;
        };
        if hits.iter().any(|h| h.url == url) {
            continue;
        }

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| sanitise(&el.text().collect::<String>()))
            .unwrap_or_default();

        let publish_date = element.select(&extras_sel).find_map(date_from_element);

        hits.push(WebHit {
            url,
            title,
            snippet,
            publish_date,
            position: hits.len(),
        });

        if hits.len() >= max_results {
            break;
        }
    }

    tracing::debug!(count = hits.len(), "results page parsed");
    Ok(hits)
}

fn selector(css: &str) -> Result<Selector, WebSearchError> {
    Selector::parse(css).map_err(|e| WebSearchError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Resolve DuckDuckGo's `//duckduckgo.com/l/?uddg=...` wrapper to the
/// destination URL. Direct links pass through; non-URLs yield `None`.
fn unwrap_redirect(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    let is_wrapper = parsed
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");
    if !is_wrapper {
        return Some(absolute);
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
}

/// First `YYYY-MM-DD` prefix found in the element's text.
fn date_from_element(el: ElementRef<'_>) -> Option<NaiveDate> {
    let text = el.text().collect::<String>();
    text.split_whitespace().find_map(|token| {
        let head = token.get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    })
}

/// Collapse whitespace runs and drop control characters.
fn sanitise(raw: &str) -> String {
    raw.split_whitespace()
        .map(|w| w.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
