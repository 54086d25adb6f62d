//! Per-query options and the cascade response envelope.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::StopPolicy;
use crate::crossref::CrossReference;
use crate::error::SourceError;
use crate::intent::QueryIntent;
use crate::types::{SearchResultItem, SourceType};

/// Caller overrides for one cascade run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Stop once this many distinct results are accumulated.
    pub stop_after_results: Option<usize>,
    /// Overall deadline; overrides the configured one.
    pub deadline: Option<Duration>,
    /// Truncate the final list; overrides the configured maximum.
    pub max_results: Option<usize>,
    /// Stop arithmetic; overrides the configured policy.
    pub stop_policy: Option<StopPolicy>,
}

impl SearchOptions {
    #[must_use]
    pub fn stop_after(mut self, results: usize) -> Self {
        self.stop_after_results = Some(results);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    #[must_use]
    pub fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.stop_policy = Some(policy);
        self
    }
}

/// What happened to one source during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded,
    Failed,
    TimedOut,
    /// Not invoked: the cascade stopped early or the deadline passed first.
    Skipped,
    /// Not invoked: the source's circuit is open.
    CircuitOpen,
}

impl SourceStatus {
    /// Whether the source was attempted and did not succeed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut | Self::CircuitOpen)
    }
}

/// Outcome of a single source invocation. Lives only until its group's
/// results are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeResult {
    pub source: SourceType,
    pub success: bool,
    pub results: Vec<SearchResultItem>,
    pub execution_time_ms: u64,
    pub error: Option<SourceError>,
}

/// Per-source line of the response, in the order sources were scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceType,
    pub priority: u32,
    pub status: SourceStatus,
    /// Items the source returned, before deduplication.
    pub result_count: usize,
    pub execution_time_ms: u64,
    pub error: Option<String>,
}

impl SourceReport {
    pub(crate) fn skipped(source: SourceType, priority: u32) -> Self {
        Self {
            source,
            priority,
            status: SourceStatus::Skipped,
            result_count: 0,
            execution_time_ms: 0,
            error: None,
        }
    }
}

/// Result envelope of [`crate::SearchCascadeEngine::search`].
///
/// Always well formed: when every source fails, `success` is false and
/// `results` is empty, but `sources_queried` still explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCascadeResponse {
    /// Deduplicated, ranked results.
    pub results: Vec<SearchResultItem>,
    /// Every selected source, with what happened to it.
    pub sources_queried: Vec<SourceReport>,
    /// Sources that returned at least one item.
    pub sources_with_results: Vec<SourceType>,
    /// Priority of the group after which the cascade stopped early.
    pub stopped_at: Option<u32>,
    /// Every group ran and the stop condition never fired.
    pub exhausted: bool,
    /// The overall deadline cut the run short.
    pub deadline_exceeded: bool,
    pub total_latency_ms: u64,
    /// At least one source succeeded.
    pub success: bool,
    /// Confidence in the answer set, `[0, 1]`.
    pub overall_confidence: f64,
    /// Claims found in more than one origin among the top results.
    pub cross_references: Vec<CrossReference>,
    /// Intent used for source routing, when routing was applied.
    pub intent: Option<QueryIntent>,
}

impl SearchCascadeResponse {
    /// Report for `source`, if it was selected.
    pub fn report(&self, source: SourceType) -> Option<&SourceReport> {
        self.sources_queried.iter().find(|r| r.source == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SourceStatus::CircuitOpen).expect("serialize");
        assert_eq!(json, "\"circuit_open\"");
        assert!(SourceStatus::TimedOut.is_failure());
        assert!(!SourceStatus::Skipped.is_failure());
    }

    #[test]
    fn options_builders() {
        let opts = SearchOptions::default()
            .stop_after(3)
            .with_deadline(Duration::from_millis(500))
            .with_max_results(7)
            .with_stop_policy(StopPolicy::CallerOnly);
        assert_eq!(opts.stop_after_results, Some(3));
        assert_eq!(opts.deadline, Some(Duration::from_millis(500)));
        assert_eq!(opts.max_results, Some(7));
        assert_eq!(opts.stop_policy, Some(StopPolicy::CallerOnly));
    }
}
