//! Document relevance scoring.
//!
//! Four components, each in `[0, 1]`:
//!
//! ```text
//! relevance = 0.5·title_cov + 0.2·keyword_cov + 0.3·content_cov (+ session bonus)
//! recency   = floor + (1 − floor) / (1 + age_days / τ)      (undated → floor)
//! urgency   = max(deadline signal, flagged keywords, manual flag)
//! type      = DocumentCategory::type_score()
//! total     = Σ wᵢ·componentᵢ / Σ wᵢ
//! ```
//!
//! The priority bucket comes from fixed thresholds on `total`, so a
//! document's priority never depends on what it is scored alongside.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::extract_session_number;
use super::types::{Document, DocumentScore, Priority, ScoringDetails};
use crate::text::{content_words, coverage, tokenize};
use crate::types::{DEFAULT_SCORE, clamp_unit};

/// Words in a title or keyword list that mark a document as urgent.
const URGENT_KEYWORDS: &[&str] = &[
    "pilne", "pilny", "pilna", "natychmiastowe", "nadzwyczajna", "nadzwyczajnej", "alarm",
    "ostrzeżenie", "termin", "urgent", "emergency", "deadline",
];

const TITLE_SHARE: f64 = 0.5;
const KEYWORD_SHARE: f64 = 0.2;
const CONTENT_SHARE: f64 = 0.3;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Tunable weights and thresholds for [`DocumentRelevanceScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentScoringSettings {
    /// Weight of the relevance component.
    pub relevance_weight: f64,
    /// Weight of the type component.
    pub type_weight: f64,
    /// Weight of the recency component.
    pub recency_weight: f64,
    /// Weight of the urgency component.
    pub urgency_weight: f64,
    /// Bonus added to relevance when query and document sessions match.
    pub session_match_bonus: f64,
    /// Age in days at which recency is halfway between 1 and the floor.
    pub recency_time_constant_days: f64,
    /// Lowest recency, given to undated documents.
    pub recency_floor: f64,
    /// Deadlines closer than this many days are maximally urgent.
    pub urgent_window_days: i64,
    /// Deadlines closer than this many days are moderately urgent.
    pub soon_window_days: i64,
    /// `total ≥` this → [`Priority::Critical`].
    pub critical_threshold: f64,
    /// `total ≥` this → [`Priority::High`].
    pub high_threshold: f64,
    /// `total ≥` this → [`Priority::Medium`].
    pub medium_threshold: f64,
}

impl Default for DocumentScoringSettings {
    fn default() -> Self {
        Self {
            relevance_weight: 0.4,
            type_weight: 0.2,
            recency_weight: 0.25,
            urgency_weight: 0.15,
            session_match_bonus: 0.5,
            recency_time_constant_days: 180.0,
            recency_floor: 0.1,
            urgent_window_days: 7,
            soon_window_days: 30,
            critical_threshold: 0.75,
            high_threshold: 0.55,
            medium_threshold: 0.35,
        }
    }
}

impl DocumentScoringSettings {
    /// Reject weights or thresholds that would break the `[0, 1]` invariants.
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            self.relevance_weight,
            self.type_weight,
            self.recency_weight,
            self.urgency_weight,
        ];
        if weights.iter().any(|w| *w < 0.0 || w.is_nan()) {
            return Err("document weights must be non-negative".into());
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err("document weights must sum to a positive value".into());
        }
        if !(self.recency_floor > 0.0 && self.recency_floor < 1.0) {
            return Err("recency_floor must be in (0, 1)".into());
        }
        if self.recency_time_constant_days <= 0.0 {
            return Err("recency_time_constant_days must be positive".into());
        }
        if !(self.critical_threshold >= self.high_threshold
            && self.high_threshold >= self.medium_threshold
            && self.medium_threshold >= 0.0
            && self.critical_threshold <= 1.0)
        {
            return Err("priority thresholds must be descending within [0, 1]".into());
        }
        if self.urgent_window_days > self.soon_window_days {
            return Err("urgent_window_days must be <= soon_window_days".into());
        }
        Ok(())
    }
}

/// Pre-processed query terms for scoring many documents against one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringQuery {
    words: BTreeSet<String>,
    session: Option<u32>,
}

impl ScoringQuery {
    /// Parse query text, extracting any session number it mentions.
    pub fn new(text: &str) -> Self {
        Self {
            words: content_words(text),
            session: extract_session_number(text),
        }
    }

    /// Override the session number with an explicit hint.
    #[must_use]
    pub fn with_session(mut self, session: Option<u32>) -> Self {
        if session.is_some() {
            self.session = session;
        }
        self
    }

    /// Session number requested by the query, if any.
    pub fn session(&self) -> Option<u32> {
        self.session
    }
}

/// Scores documents for relevance, urgency, type and recency.
#[derive(Debug, Clone, Default)]
pub struct DocumentRelevanceScorer {
    settings: DocumentScoringSettings,
}

impl DocumentRelevanceScorer {
    /// Create a scorer with the given settings.
    pub fn new(settings: DocumentScoringSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    pub fn settings(&self) -> &DocumentScoringSettings {
        &self.settings
    }

    /// Score `document` against an optional free-text query, as of now.
    pub fn score(&self, document: &Document, query: Option<&str>) -> DocumentScore {
        let parsed = query.map(ScoringQuery::new);
        self.score_at(document, parsed.as_ref(), Utc::now())
    }

    /// Score `document` against a pre-parsed query as of `now`.
    pub fn score_at(
        &self,
        document: &Document,
        query: Option<&ScoringQuery>,
        now: DateTime<Utc>,
    ) -> DocumentScore {
        let mut details = ScoringDetails::default();

        let relevance_score = match query {
            Some(q) => self.relevance(document, q, &mut details),
            None => DEFAULT_SCORE,
        };
        let recency_score = self.recency(document, now, &mut details);
        let urgency_score = self.urgency(document, now, &mut details);
        let type_score = document.category.type_score();

        let s = &self.settings;
        let weight_sum = s.relevance_weight + s.type_weight + s.recency_weight + s.urgency_weight;
        let total_score = if weight_sum > 0.0 {
            clamp_unit(
                (s.relevance_weight * relevance_score
                    + s.type_weight * type_score
                    + s.recency_weight * recency_score
                    + s.urgency_weight * urgency_score)
                    / weight_sum,
            )
        } else {
            0.0
        };

        DocumentScore {
            relevance_score,
            urgency_score,
            type_score,
            recency_score,
            total_score,
            priority: self.bucket(total_score),
            scoring_details: details,
        }
    }

    /// Score and sort documents for a listing: total descending, ties in
    /// input order.
    pub fn rank(&self, documents: Vec<Document>, query: Option<&str>) -> Vec<(Document, DocumentScore)> {
        let parsed = query.map(ScoringQuery::new);
        let now = Utc::now();
        let mut scored: Vec<(Document, DocumentScore)> = documents
            .into_iter()
            .map(|doc| {
                let score = self.score_at(&doc, parsed.as_ref(), now);
                (doc, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_score.total_cmp(&a.1.total_score));
        scored
    }

    /// Priority bucket for a total score.
    pub fn bucket(&self, total: f64) -> Priority {
        let s = &self.settings;
        if total >= s.critical_threshold {
            Priority::Critical
        } else if total >= s.high_threshold {
            Priority::High
        } else if total >= s.medium_threshold {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    fn relevance(&self, document: &Document, query: &ScoringQuery, details: &mut ScoringDetails) -> f64 {
        let title = content_words(&document.title);
        let keywords = content_words(&document.keywords.join(" "));
        let content = content_words(&document.content);

        details.matched_terms = query
            .words
            .iter()
            .filter(|w| title.contains(*w) || keywords.contains(*w) || content.contains(*w))
            .cloned()
            .collect();

        let mut score = TITLE_SHARE * coverage(&query.words, &title)
            + KEYWORD_SHARE * coverage(&query.words, &keywords)
            + CONTENT_SHARE * coverage(&query.words, &content);

        details.query_session = query.session;
        details.document_session = document_session(document);
        if let (Some(wanted), Some(found)) = (details.query_session, details.document_session) {
            if wanted == found {
                details.session_match = true;
                score += self.settings.session_match_bonus;
            }
        }

        clamp_unit(score)
    }

    fn recency(&self, document: &Document, now: DateTime<Utc>, details: &mut ScoringDetails) -> f64 {
        let floor = self.settings.recency_floor;
        let Some(date) = document.effective_date() else {
            return floor;
        };
        let age_secs = (now - date).num_seconds().max(0) as f64;
        details.age_days = Some((now - date).num_days().max(0));
        let age_days = age_secs / SECONDS_PER_DAY;
        floor + (1.0 - floor) / (1.0 + age_days / self.settings.recency_time_constant_days)
    }

    fn urgency(&self, document: &Document, now: DateTime<Utc>, details: &mut ScoringDetails) -> f64 {
        let mut urgency: f64 = 0.1;

        if document.signals.urgent {
            details.urgency_signals.push("flagged_urgent".into());
            urgency = 1.0;
        }

        if let Some(deadline) = document.signals.deadline {
            let days_left = (deadline - now).num_days();
            let (signal, value) = if deadline < now {
                ("deadline_passed", 0.2)
            } else if days_left <= self.settings.urgent_window_days {
                ("deadline_imminent", 1.0)
            } else if days_left <= self.settings.soon_window_days {
                ("deadline_soon", 0.7)
            } else {
                ("deadline_scheduled", 0.4)
            };
            details.urgency_signals.push(signal.into());
            urgency = urgency.max(value);
        }

        let mut flagged: Vec<String> = tokenize(&document.title)
            .into_iter()
            .chain(document.keywords.iter().flat_map(|k| tokenize(k)))
            .filter(|t| URGENT_KEYWORDS.contains(&t.as_str()))
            .collect();
        flagged.sort();
        flagged.dedup();
        if !flagged.is_empty() {
            let value = if flagged.len() >= 2 { 0.8 } else { 0.6 };
            urgency = urgency.max(value);
            details
                .urgency_signals
                .extend(flagged.into_iter().map(|k| format!("keyword:{k}")));
        }

        clamp_unit(urgency)
    }
}

/// Session number of a document: from the title, else the content head.
pub fn document_session(document: &Document) -> Option<u32> {
    extract_session_number(&document.title).or_else(|| {
        let head: String = document.content.chars().take(400).collect();
        extract_session_number(&head)
    })
}
