//! Cascade engine.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::Instant;

use super::breaker::{CircuitBreaker, CircuitState};
use super::confidence::overall_confidence;
use super::response::{
    CascadeResult, SearchCascadeResponse, SearchOptions, SourceReport, SourceStatus,
};
use super::CascadeSettings;
use crate::adapters::SourceRegistry;
use crate::config::{CascadeConfig, validate_sources};
use crate::credibility::{CredibilityAssessor, CredibilitySettings};
use crate::crossref::CrossReferencer;
use crate::error::{CascadeError, SourceError};
use crate::intent::QueryIntent;
use crate::llm::LlmClient;
use crate::rank::Accumulator;
use crate::types::{SearchQuery, SearchResultItem, SourceConfig, SourceType};

/// One source invocation plus what the cascade needs to fold it in.
struct SourceRun {
    result: CascadeResult,
    status: SourceStatus,
    min_results_to_stop: usize,
    deadline_hit: bool,
}

impl SourceRun {
    fn failed(config: &SourceConfig, status: SourceStatus, error: SourceError, elapsed_ms: u64) -> Self {
        Self {
            result: CascadeResult {
                source: config.source_type,
                success: false,
                results: Vec::new(),
                execution_time_ms: elapsed_ms,
                error: Some(error),
            },
            status,
            min_results_to_stop: config.min_results_to_stop,
            deadline_hit: false,
        }
    }
}

/// Priority-ordered multi-source search.
///
/// Owns its adapters, its circuit breaker and its assessors; nothing is
/// process-global, so several engines with different configurations can
/// coexist.
pub struct SearchCascadeEngine {
    registry: SourceRegistry,
    sources: Vec<SourceConfig>,
    settings: CascadeSettings,
    assessor: CredibilityAssessor,
    cross_referencer: CrossReferencer,
    breaker: Mutex<CircuitBreaker>,
}

impl std::fmt::Debug for SearchCascadeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCascadeEngine")
            .field("registry", &self.registry)
            .field("sources", &self.sources)
            .field("settings", &self.settings)
            .finish()
    }
}

impl SearchCascadeEngine {
    /// Build an engine over `registry` with the given source table.
    ///
    /// Open-web items are assessed with default credibility settings and
    /// no LLM until [`with_assessor`](Self::with_assessor) replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Config`] for an invalid source table or
    /// settings.
    pub fn new(
        registry: SourceRegistry,
        sources: Vec<SourceConfig>,
        settings: CascadeSettings,
    ) -> crate::Result<Self> {
        validate_sources(&sources).map_err(CascadeError::Config)?;
        settings.validate().map_err(CascadeError::Config)?;
        for source in sources.iter().filter(|s| s.enabled) {
            if !registry.contains(source.source_type) {
                tracing::warn!(source = %source.source_type, "enabled source has no adapter");
            }
        }
        let breaker = Mutex::new(CircuitBreaker::new(settings.circuit_breaker.clone()));
        Ok(Self {
            registry,
            sources,
            settings,
            assessor: CredibilityAssessor::new(CredibilitySettings::default(), None),
            cross_referencer: CrossReferencer::default(),
            breaker,
        })
    }

    /// Build an engine from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::Config`] if the configuration is invalid.
    pub fn from_config(
        config: &CascadeConfig,
        registry: SourceRegistry,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> crate::Result<Self> {
        config.validate()?;
        Ok(
            Self::new(registry, config.sources.clone(), config.cascade.clone())?
                .with_assessor(CredibilityAssessor::new(config.credibility.clone(), llm))
                .with_cross_referencer(CrossReferencer::new(config.cross_reference.clone())),
        )
    }

    #[must_use]
    pub fn with_assessor(mut self, assessor: CredibilityAssessor) -> Self {
        self.assessor = assessor;
        self
    }

    #[must_use]
    pub fn with_cross_referencer(mut self, cross_referencer: CrossReferencer) -> Self {
        self.cross_referencer = cross_referencer;
        self
    }

    pub fn settings(&self) -> &CascadeSettings {
        &self.settings
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    /// Circuit state of `source`.
    pub fn circuit_state(&self, source: SourceType) -> CircuitState {
        self.breaker().state(source)
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `query` through the cascade.
    ///
    /// Never fails: source errors, timeouts and open circuits are recorded
    /// per source in [`SearchCascadeResponse::sources_queried`].
    pub async fn search(&self, query: &SearchQuery, options: &SearchOptions) -> SearchCascadeResponse {
        let started = Instant::now();
        let deadline = options
            .deadline
            .or_else(|| {
                (self.settings.overall_deadline_ms > 0)
                    .then(|| Duration::from_millis(self.settings.overall_deadline_ms))
            })
            .map(|d| started + d);
        let policy = options.stop_policy.unwrap_or(self.settings.stop_policy);
        let (selected, intent) = self.select_sources(query);
        tracing::trace!(query = %query.text, ?intent, sources = selected.len(), "cascade started");

        let mut groups: BTreeMap<u32, Vec<&SourceConfig>> = BTreeMap::new();
        for config in selected {
            groups.entry(config.priority).or_default().push(config);
        }

        let mut acc = Accumulator::new();
        let mut reports: Vec<SourceReport> = Vec::new();
        let mut responders: Vec<usize> = Vec::new();
        let mut sources_with_results: Vec<SourceType> = Vec::new();
        let mut stopped_at = None;
        let mut deadline_exceeded = false;

        let mut pending = groups.into_iter();
        for (priority, members) in pending.by_ref() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                deadline_exceeded = true;
                reports.extend(members.iter().map(|c| SourceReport::skipped(c.source_type, priority)));
                continue;
            }

            for run in self.run_group(query, &members, deadline).await {
                deadline_exceeded |= run.deadline_hit;
                let SourceRun {
                    result,
                    status,
                    min_results_to_stop,
                    ..
                } = run;
                reports.push(SourceReport {
                    source: result.source,
                    priority,
                    status,
                    result_count: result.results.len(),
                    execution_time_ms: result.execution_time_ms,
                    error: result.error.as_ref().map(ToString::to_string),
                });
                if result.success && !result.results.is_empty() {
                    let (items, cut_short) =
                        self.prepare(result.source, result.results, deadline).await;
                    deadline_exceeded |= cut_short;
                    if !items.is_empty() {
                        responders.push(min_results_to_stop);
                        sources_with_results.push(result.source);
                        acc.absorb(items, priority);
                    }
                }
            }

            if !query.exhaustive
                && policy.should_stop(acc.len(), &responders, options.stop_after_results)
            {
                tracing::debug!(priority, accumulated = acc.len(), "stop condition met");
                stopped_at = Some(priority);
                break;
            }
        }
        for (priority, members) in pending {
            reports.extend(members.iter().map(|c| SourceReport::skipped(c.source_type, priority)));
        }

        let mut results = acc.into_ranked();
        results.truncate(options.max_results.unwrap_or(self.settings.max_results));
        let window = results.len().min(self.settings.max_cross_reference_items);
        let cross_references = self.cross_referencer.cross_reference(&results[..window]);
        let confidence = overall_confidence(&results, &cross_references);

        let success = reports.iter().any(|r| r.status == SourceStatus::Succeeded);
        let exhausted = stopped_at.is_none() && !deadline_exceeded;
        let total_latency_ms = elapsed_ms(started);

        tracing::info!(
            results = results.len(),
            sources = reports.len(),
            responders = sources_with_results.len(),
            ?stopped_at,
            exhausted,
            deadline_exceeded,
            latency_ms = total_latency_ms,
            "cascade finished"
        );

        SearchCascadeResponse {
            results,
            sources_queried: reports,
            sources_with_results,
            stopped_at,
            exhausted,
            deadline_exceeded,
            total_latency_ms,
            success,
            overall_confidence: confidence,
            cross_references,
            intent,
        }
    }

    /// Enabled sources for `query`: the explicit subset if given, else the
    /// intent's preferred sources when routing is on, else all of them.
    fn select_sources(&self, query: &SearchQuery) -> (Vec<&SourceConfig>, Option<QueryIntent>) {
        let enabled = self.sources.iter().filter(|c| c.enabled);
        if !query.requested_sources.is_empty() {
            let subset = enabled
                .filter(|c| query.requested_sources.contains(&c.source_type))
                .collect();
            return (subset, None);
        }
        if self.settings.intent_routing {
            let intent = QueryIntent::classify(&query.text);
            let preferred = intent.preferred_sources();
            let routed: Vec<&SourceConfig> = self
                .sources
                .iter()
                .filter(|c| c.enabled && preferred.contains(&c.source_type))
                .collect();
            if !routed.is_empty() {
                return (routed, Some(intent));
            }
        }
        (enabled.collect(), None)
    }

    /// Run one priority group with bounded concurrency. Runs come back in
    /// configuration order regardless of completion order.
    async fn run_group(
        &self,
        query: &SearchQuery,
        members: &[&SourceConfig],
        deadline: Option<Instant>,
    ) -> Vec<SourceRun> {
        let limit = self.settings.max_concurrent_sources.max(1);
        let mut runs: Vec<(usize, SourceRun)> = futures_util::stream::iter(members.iter().enumerate())
            .map(|(idx, config)| async move { (idx, self.run_source(query, config, deadline).await) })
            .buffer_unordered(limit)
            .collect()
            .await;
        runs.sort_by_key(|(idx, _)| *idx);
        runs.into_iter().map(|(_, run)| run).collect()
    }

    async fn run_source(
        &self,
        query: &SearchQuery,
        config: &SourceConfig,
        deadline: Option<Instant>,
    ) -> SourceRun {
        let source = config.source_type;
        let Some(adapter) = self.registry.get(source) else {
            return SourceRun::failed(
                config,
                SourceStatus::Failed,
                SourceError::Unavailable("no adapter registered".into()),
                0,
            );
        };

        let admitted = self.breaker().should_attempt(source);
        if !admitted {
            let failures = self.breaker().consecutive_failures(source);
            tracing::debug!(%source, failures, "circuit open, source not invoked");
            return SourceRun::failed(
                config,
                SourceStatus::CircuitOpen,
                SourceError::CircuitOpen(failures),
                0,
            );
        }

        let started = Instant::now();
        let call = tokio::time::timeout(Duration::from_millis(config.timeout_ms), adapter.search(query));
        let outcome = match deadline {
            Some(at) => tokio::time::timeout_at(at, call).await.ok(),
            None => Some(call.await),
        };
        let elapsed = elapsed_ms(started);

        match outcome {
            Some(Ok(Ok(items))) => {
                self.breaker().record_success(source);
                tracing::debug!(%source, count = items.len(), elapsed_ms = elapsed, "source succeeded");
                SourceRun {
                    result: CascadeResult {
                        source,
                        success: true,
                        results: items,
                        execution_time_ms: elapsed,
                        error: None,
                    },
                    status: SourceStatus::Succeeded,
                    min_results_to_stop: config.min_results_to_stop,
                    deadline_hit: false,
                }
            }
            Some(Ok(Err(error))) => {
                self.breaker().record_failure(source);
                tracing::warn!(%source, %error, elapsed_ms = elapsed, "source failed");
                SourceRun::failed(config, SourceStatus::Failed, error, elapsed)
            }
            Some(Err(_)) => {
                self.breaker().record_failure(source);
                tracing::warn!(%source, timeout_ms = config.timeout_ms, "source timed out");
                SourceRun::failed(
                    config,
                    SourceStatus::TimedOut,
                    SourceError::Timeout(config.timeout_ms),
                    elapsed,
                )
            }
            None => {
                self.breaker().abandon_probe(source);
                tracing::warn!(%source, elapsed_ms = elapsed, "overall deadline reached, source abandoned");
                SourceRun {
                    deadline_hit: true,
                    ..SourceRun::failed(
                        config,
                        SourceStatus::TimedOut,
                        SourceError::Timeout(elapsed),
                        elapsed,
                    )
                }
            }
        }
    }

    /// Assess open-web items and apply the credibility floor; other
    /// sources pass through. Assessment still pending at `deadline` is
    /// abandoned and the items are scored without the model; the flag
    /// returned is whether that happened.
    async fn prepare(
        &self,
        source: SourceType,
        items: Vec<SearchResultItem>,
        deadline: Option<Instant>,
    ) -> (Vec<SearchResultItem>, bool) {
        if source != SourceType::Web {
            return (items, false);
        }
        let (mut items, cut_short) = match deadline {
            Some(at) => {
                match tokio::time::timeout_at(at, self.assessor.annotate(items.clone())).await {
                    Ok(items) => (items, false),
                    Err(_) => {
                        tracing::warn!(
                            items = items.len(),
                            "overall deadline reached during credibility assessment"
                        );
                        let items = self
                            .assessor
                            .annotate_without_model(items, "assessment deadline reached");
                        (items, true)
                    }
                }
            }
            None => (self.assessor.annotate(items).await, false),
        };
        if let Some(min) = self.settings.min_web_credibility {
            let before = items.len();
            items.retain(|item| item.credibility.is_some_and(|c| c >= min));
            tracing::debug!(dropped = before - items.len(), min, "web credibility filter");
        }
        (items, cut_short)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
