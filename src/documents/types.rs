//! Document and document-score types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a locally indexed council document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    /// Council resolution (uchwała).
    Resolution,
    /// Budget or budget amendment.
    Budget,
    /// Session protocol / minutes.
    SessionProtocol,
    /// Mayor's ordinance (zarządzenie).
    Ordinance,
    /// Session agenda.
    SessionAgenda,
    /// Councillor interpellation or query.
    Interpellation,
    /// Report or analysis.
    Report,
    /// Generic announcement.
    Announcement,
    /// Anything else.
    #[default]
    Other,
}

impl DocumentCategory {
    /// Fixed type score used by the relevance scorer.
    pub fn type_score(&self) -> f64 {
        match self {
            Self::Resolution => 1.0,
            Self::Budget => 0.9,
            Self::SessionProtocol => 0.85,
            Self::Ordinance => 0.8,
            Self::SessionAgenda => 0.75,
            Self::Interpellation => 0.6,
            Self::Report => 0.55,
            Self::Announcement => 0.4,
            Self::Other => 0.3,
        }
    }
}

/// Explicit urgency signals carried in document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSignals {
    /// A response or objection deadline attached to the document.
    pub deadline: Option<DateTime<Utc>>,
    /// Manually flagged as urgent during ingestion.
    pub urgent: bool,
}

/// A locally indexed document, as handed over by the ingestion pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Stable identifier in the local store.
    pub id: String,
    /// Document title.
    pub title: String,
    /// Extracted text content.
    pub content: String,
    /// Keywords assigned at ingestion.
    pub keywords: Vec<String>,
    /// Document category.
    pub category: DocumentCategory,
    /// Public URL, if the document is published.
    pub url: Option<String>,
    /// Publication timestamp.
    pub published_at: Option<DateTime<Utc>>,
    /// Ingestion timestamp, used when no publication date is known.
    pub processed_at: Option<DateTime<Utc>>,
    /// Urgency signals.
    pub signals: DocumentSignals,
}

impl Document {
    /// Create a document with the given id, title and category.
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: DocumentCategory) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            ..Default::default()
        }
    }

    /// Set the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the publication timestamp.
    #[must_use]
    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Set the keywords.
    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Best available date: publication, else ingestion.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.processed_at)
    }
}

/// Priority bucket assigned from fixed thresholds on the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Needs attention now.
    Critical,
    /// Important.
    High,
    /// Normal.
    Medium,
    /// Background.
    Low,
}

/// Breakdown explaining a [`DocumentScore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringDetails {
    /// Query words found in the title, keywords or content.
    pub matched_terms: Vec<String>,
    /// Session number requested by the query.
    pub query_session: Option<u32>,
    /// Session number extracted from the document.
    pub document_session: Option<u32>,
    /// Whether the two session numbers matched.
    pub session_match: bool,
    /// Age of the effective date in whole days, if dated.
    pub age_days: Option<i64>,
    /// Urgency signals that fired.
    pub urgency_signals: Vec<String>,
}

/// Derived, per-call score of a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentScore {
    /// Topical match with the query, `[0, 1]`.
    pub relevance_score: f64,
    /// Urgency from metadata signals, `[0, 1]`.
    pub urgency_score: f64,
    /// Category score, `[0, 1]`.
    pub type_score: f64,
    /// Recency decay, `(0, 1]`.
    pub recency_score: f64,
    /// Weighted combination of the four components, `[0, 1]`.
    pub total_score: f64,
    /// Bucket derived from `total_score`.
    pub priority: Priority,
    /// Explanation of the components.
    pub scoring_details: ScoringDetails,
}
