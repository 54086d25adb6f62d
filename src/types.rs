//! Core types shared by every stage of the cascade.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::credibility::CredibilityFlag;
use crate::documents::Priority;

/// Score given to items that carry no natural score of their own.
pub const DEFAULT_SCORE: f64 = 0.5;

/// Clamp a score into `[0, 1]`. NaN maps to [`DEFAULT_SCORE`].
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_SCORE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Closed set of source kinds the cascade knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Locally indexed documents (council resolutions, protocols, ...).
    LocalIndex,
    /// Public statistics registry.
    Statistics,
    /// Legal-act registry.
    LegalActs,
    /// Business registry.
    BusinessRegistry,
    /// Spatial / land registry.
    Spatial,
    /// Open-web search.
    Web,
    /// Slow multi-hop research source.
    DeepResearch,
}

impl SourceType {
    /// Stable snake_case name, matching the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalIndex => "local_index",
            Self::Statistics => "statistics",
            Self::LegalActs => "legal_acts",
            Self::BusinessRegistry => "business_registry",
            Self::Spatial => "spatial",
            Self::Web => "web",
            Self::DeepResearch => "deep_research",
        }
    }

    /// Every variant, in declaration order.
    pub fn all() -> &'static [SourceType] {
        &[
            Self::LocalIndex,
            Self::Statistics,
            Self::LegalActs,
            Self::BusinessRegistry,
            Self::Spatial,
            Self::Web,
            Self::DeepResearch,
        ]
    }

    /// Whether this source is one of the public registries.
    pub fn is_registry(&self) -> bool {
        matches!(
            self,
            Self::Statistics | Self::LegalActs | Self::BusinessRegistry | Self::Spatial
        )
    }

    /// Trust assumed for items from this source when no credibility
    /// assessment exists. Open-web items are always assessed.
    pub fn baseline_trust(&self) -> f64 {
        match self {
            Self::Statistics | Self::LegalActs | Self::BusinessRegistry | Self::Spatial => 0.95,
            Self::LocalIndex => 0.9,
            Self::DeepResearch => 0.7,
            Self::Web => DEFAULT_SCORE,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-source cascade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Which source this entry configures.
    pub source_type: SourceType,
    /// Lower values are tried first. Sources sharing a priority run together.
    pub priority: u32,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Accumulated result count at which this source considers the
    /// cascade satisfied (see [`crate::cascade::StopPolicy`]).
    pub min_results_to_stop: usize,
    /// Disabled sources are never queried nor reported.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl SourceConfig {
    /// Create an enabled source with a 5 s timeout and a stop threshold of 3.
    pub fn new(source_type: SourceType, priority: u32) -> Self {
        Self {
            source_type,
            priority,
            timeout_ms: 5_000,
            min_results_to_stop: 3,
            enabled: true,
        }
    }

    /// Set the per-call timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the stop threshold.
    #[must_use]
    pub fn with_min_results(mut self, min_results_to_stop: usize) -> Self {
        self.min_results_to_stop = min_results_to_stop;
        self
    }

    /// Enable or disable the source.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included, if bounded.
    pub from: Option<NaiveDate>,
    /// Last day included, if bounded.
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Whether `date` falls inside the window. Undated items are kept.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return true;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// A single cascade query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Free-text query.
    pub text: String,
    /// Explicit council-session number hint.
    pub session_number: Option<u32>,
    /// Restrict results to this publication window.
    pub date_range: Option<DateRange>,
    /// Restrict the cascade to these sources. Empty means every enabled source.
    pub requested_sources: Vec<SourceType>,
    /// Disable early stopping and query every selected source.
    pub exhaustive: bool,
}

impl SearchQuery {
    /// Create a query with no hints.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attach a session-number hint.
    #[must_use]
    pub fn with_session(mut self, session: u32) -> Self {
        self.session_number = Some(session);
        self
    }

    /// Attach a date window.
    #[must_use]
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Restrict to a subset of sources.
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<SourceType>) -> Self {
        self.requested_sources = sources;
        self
    }

    /// Toggle exhaustive mode.
    #[must_use]
    pub fn exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }
}

/// Provenance and auxiliary data attached to a result item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemMetadata {
    /// Every source that returned this item. Deduplication appends to it,
    /// so it is never empty and never loses provenance.
    pub contributing_sources: Vec<SourceType>,
    /// Publication date, when known.
    pub published_at: Option<NaiveDate>,
    /// Identifier within the originating source.
    pub source_id: Option<String>,
    /// Session number extracted from a local document.
    pub session_number: Option<u32>,
    /// Priority bucket from the document scorer (local documents only).
    pub document_priority: Option<Priority>,
    /// Categorical credibility flags (open-web items only).
    pub credibility_flags: Vec<CredibilityFlag>,
    /// Source-specific structured fields.
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// The unified result unit every source is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Display title.
    pub title: String,
    /// Body text or snippet.
    pub content: String,
    /// Canonical location, when the source has one.
    pub url: Option<String>,
    /// The source that produced the surviving copy of this item.
    pub source_type: SourceType,
    /// Topical relevance in `[0, 1]`.
    pub relevance: f64,
    /// Credibility in `[0, 1]`; set for assessed open-web items.
    pub credibility: Option<f64>,
    /// Provenance and auxiliary data.
    pub metadata: ItemMetadata,
}

impl SearchResultItem {
    /// Create an item with the default relevance and itself as sole contributor.
    pub fn new(title: impl Into<String>, content: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            url: None,
            source_type,
            relevance: DEFAULT_SCORE,
            credibility: None,
            metadata: ItemMetadata {
                contributing_sources: vec![source_type],
                ..Default::default()
            },
        }
    }

    /// Attach a URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set relevance, clamped into `[0, 1]`.
    #[must_use]
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = clamp_unit(relevance);
        self
    }

    /// Set the publication date.
    #[must_use]
    pub fn with_published_at(mut self, date: Option<NaiveDate>) -> Self {
        self.metadata.published_at = date;
        self
    }

    /// Trust used for confidence aggregation: the assessed credibility,
    /// else the source's baseline.
    pub fn trust(&self) -> f64 {
        self.credibility
            .unwrap_or_else(|| self.source_type.baseline_trust())
    }
}
