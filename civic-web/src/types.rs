//! Raw open-web hit shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single raw hit returned by the open-web transport.
///
/// `position` is the 0-based rank on the results page; the cascade derives
/// a relevance score from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebHit {
    /// Destination URL (redirect wrappers already removed).
    pub url: String,
    /// Page title as shown on the results page.
    pub title: String,
    /// Sanitised result snippet.
    pub snippet: String,
    /// Publish date when the results page exposes one.
    pub publish_date: Option<NaiveDate>,
    /// 0-based position on the results page.
    pub position: usize,
}

impl WebHit {
    /// Host part of the URL, lowercased, if the URL parses.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
    }
}
