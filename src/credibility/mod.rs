//! Credibility assessment for open-web results.
//!
//! Each web hit is scored from its domain (static trust table), its text
//! (LLM judgement, optional) and its publication date. The blended score is
//! always in `[0, 1]`; any LLM failure falls back to neutral values and a
//! low-severity `unassessed` flag rather than an error.

pub mod domains;
pub mod freshness;
pub mod quality;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::llm::LlmClient;
use crate::types::{DEFAULT_SCORE, SearchResultItem, SourceType, clamp_unit};

pub use domains::{DomainCategory, DomainEntry, DomainMatch, DomainTable, MatchKind};
pub use freshness::FreshnessSettings;
pub use quality::QualityEstimate;

/// Kind of a credibility flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    /// Domain known for fabricated news.
    FakeNews,
    /// Domain publishes satire.
    Satire,
    /// Content older than the freshness horizon.
    Outdated,
    /// The model judged the content poor.
    LowQuality,
    /// The model judged the content one-sided.
    Biased,
    /// No model judgement was available; neutral values were used.
    Unassessed,
}

/// Flag severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Should be surfaced to the user.
    Medium,
    /// The item should not be relied on.
    High,
}

/// A categorical warning attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityFlag {
    /// What was detected.
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    /// How much it matters.
    pub severity: Severity,
    /// Human-readable explanation.
    pub reason: String,
}

impl CredibilityFlag {
    fn new(flag_type: FlagType, severity: Severity, reason: impl Into<String>) -> Self {
        Self {
            flag_type,
            severity,
            reason: reason.into(),
        }
    }
}

/// Outcome of assessing one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityScore {
    /// Blended credibility in `[0, 1]`.
    pub overall: f64,
    /// Trust of the hosting domain.
    pub domain_trust: f64,
    /// Model-judged informativeness (0.5 when unassessed).
    pub content_quality: f64,
    /// Model-judged factual accuracy, when available.
    pub factual_accuracy: Option<f64>,
    /// Model-judged one-sidedness, when available.
    pub bias_level: Option<f64>,
    /// Publish-date freshness.
    pub freshness: f64,
    /// Rule-derived warnings.
    pub flags: Vec<CredibilityFlag>,
}

/// Component weights of the blended score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityWeights {
    pub domain: f64,
    pub quality: f64,
    pub factual: f64,
    /// Applied to `1 - bias`.
    pub bias: f64,
    pub freshness: f64,
}

impl Default for CredibilityWeights {
    fn default() -> Self {
        Self {
            domain: 0.4,
            quality: 0.2,
            factual: 0.15,
            bias: 0.1,
            freshness: 0.15,
        }
    }
}

impl CredibilityWeights {
    fn sum(&self) -> f64 {
        self.domain + self.quality + self.factual + self.bias + self.freshness
    }
}

/// Assessor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilitySettings {
    pub weights: CredibilityWeights,
    pub freshness: FreshnessSettings,
    /// Per-item LLM budget in milliseconds.
    pub llm_timeout_ms: u64,
    /// Rows added to (or overriding) the built-in domain table.
    pub extra_domains: Vec<DomainEntry>,
    /// Items assessed in parallel.
    pub max_concurrent_assessments: usize,
    /// Model quality below this raises `low_quality`.
    pub low_quality_threshold: f64,
    /// Model bias above this raises `biased`.
    pub high_bias_threshold: f64,
}

impl Default for CredibilitySettings {
    fn default() -> Self {
        Self {
            weights: CredibilityWeights::default(),
            freshness: FreshnessSettings::default(),
            llm_timeout_ms: 8_000,
            extra_domains: Vec::new(),
            max_concurrent_assessments: 4,
            low_quality_threshold: 0.3,
            high_bias_threshold: 0.7,
        }
    }
}

impl CredibilitySettings {
    /// Check weights, thresholds and the freshness curve.
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.weights;
        if [w.domain, w.quality, w.factual, w.bias, w.freshness]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err("credibility weights must be finite and non-negative".into());
        }
        if w.sum() <= 0.0 {
            return Err("credibility weights must sum to a positive value".into());
        }
        if self.max_concurrent_assessments == 0 {
            return Err("max_concurrent_assessments must be at least 1".into());
        }
        for (name, value) in [
            ("low_quality_threshold", self.low_quality_threshold),
            ("high_bias_threshold", self.high_bias_threshold),
            ("freshness.floor", self.freshness.floor),
            ("freshness.undated", self.freshness.undated),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        if self.freshness.half_life_days <= 0.0 {
            return Err("freshness.half_life_days must be positive".into());
        }
        if self.freshness.fresh_days < 0 || self.freshness.horizon_days < self.freshness.fresh_days {
            return Err("freshness window must satisfy 0 <= fresh_days <= horizon_days".into());
        }
        Ok(())
    }
}

/// Scores open-web items.
pub struct CredibilityAssessor {
    settings: CredibilitySettings,
    table: DomainTable,
    llm: Option<Arc<dyn LlmClient>>,
}

impl std::fmt::Debug for CredibilityAssessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredibilityAssessor")
            .field("settings", &self.settings)
            .field("llm", &self.llm.is_some())
            .finish()
    }
}

impl CredibilityAssessor {
    /// Build an assessor. Without an LLM every item is scored with neutral
    /// content values and flagged `unassessed`.
    pub fn new(settings: CredibilitySettings, llm: Option<Arc<dyn LlmClient>>) -> Self {
        let table = DomainTable::builtin().with_extra(&settings.extra_domains);
        Self {
            settings,
            table,
            llm,
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &CredibilitySettings {
        &self.settings
    }

    /// Assess `item` as of today.
    pub async fn assess(&self, item: &SearchResultItem) -> CredibilityScore {
        self.assess_at(item, Utc::now().date_naive()).await
    }

    /// Assess `item` as of `today`.
    pub async fn assess_at(&self, item: &SearchResultItem, today: NaiveDate) -> CredibilityScore {
        let judgement = self.judge(item).await;
        self.score(item, today, judgement)
    }

    /// Score `item` from its domain and freshness alone, as when the model
    /// could not be consulted. The item carries an `unassessed` flag with
    /// `reason`.
    pub fn assess_without_model(
        &self,
        item: &SearchResultItem,
        reason: &str,
    ) -> CredibilityScore {
        self.score(item, Utc::now().date_naive(), Err(reason.to_string()))
    }

    fn score(
        &self,
        item: &SearchResultItem,
        today: NaiveDate,
        judgement: Result<QualityEstimate, String>,
    ) -> CredibilityScore {
        let mut flags = Vec::new();

        let domain = item
            .url
            .as_deref()
            .and_then(host_of)
            .map(|host| self.table.lookup(&host))
            .unwrap_or(DomainMatch {
                trust: domains::NEUTRAL_TRUST,
                category: DomainCategory::Unknown,
                pattern: None,
            });
        let pattern = domain.pattern.as_deref().unwrap_or("unknown");
        match domain.category {
            DomainCategory::Satire => flags.push(CredibilityFlag::new(
                FlagType::Satire,
                Severity::Medium,
                format!("{pattern} publishes satire"),
            )),
            DomainCategory::Unreliable => flags.push(CredibilityFlag::new(
                FlagType::FakeNews,
                Severity::High,
                format!("{pattern} is known for fabricated news"),
            )),
            DomainCategory::Government
            | DomainCategory::Academic
            | DomainCategory::Press
            | DomainCategory::Encyclopedia
            | DomainCategory::UserGenerated
            | DomainCategory::Unknown => {}
        }

        let estimate = match judgement {
            Ok(estimate) => {
                if estimate.content_quality < self.settings.low_quality_threshold {
                    flags.push(CredibilityFlag::new(
                        FlagType::LowQuality,
                        Severity::Low,
                        format!("content quality {:.2}", estimate.content_quality),
                    ));
                }
                if let Some(bias) = estimate.bias_level
                    && bias > self.settings.high_bias_threshold
                {
                    flags.push(CredibilityFlag::new(
                        FlagType::Biased,
                        Severity::Medium,
                        format!("bias level {bias:.2}"),
                    ));
                }
                estimate
            }
            Err(reason) => {
                flags.push(CredibilityFlag::new(FlagType::Unassessed, Severity::Low, reason));
                QualityEstimate {
                    content_quality: DEFAULT_SCORE,
                    factual_accuracy: None,
                    bias_level: None,
                }
            }
        };

        let (fresh, age) =
            freshness::freshness(item.metadata.published_at, today, &self.settings.freshness);
        if let Some(age) = age
            && age > self.settings.freshness.horizon_days
        {
            flags.push(CredibilityFlag::new(
                FlagType::Outdated,
                Severity::Low,
                format!("published {age} days ago"),
            ));
        }

        let w = &self.settings.weights;
        let blended = (w.domain * domain.trust
            + w.quality * estimate.content_quality
            + w.factual * estimate.factual_accuracy.unwrap_or(DEFAULT_SCORE)
            + w.bias * (1.0 - estimate.bias_level.unwrap_or(DEFAULT_SCORE))
            + w.freshness * fresh)
            / w.sum();
        let overall = clamp_unit(blended).min(domain.category.overall_ceiling());

        CredibilityScore {
            overall,
            domain_trust: domain.trust,
            content_quality: estimate.content_quality,
            factual_accuracy: estimate.factual_accuracy,
            bias_level: estimate.bias_level,
            freshness: fresh,
            flags,
        }
    }

    async fn judge(&self, item: &SearchResultItem) -> Result<QualityEstimate, String> {
        let Some(llm) = &self.llm else {
            return Err("no language model configured".into());
        };
        let prompt = quality::build_prompt(item);
        let budget = Duration::from_millis(self.settings.llm_timeout_ms);
        let reply = match tokio::time::timeout(budget, llm.complete(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "credibility assessment fell back to neutral");
                return Err(format!("assessment failed: {e}"));
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.settings.llm_timeout_ms, "credibility assessment timed out");
                return Err(format!(
                    "assessment timed out after {} ms",
                    self.settings.llm_timeout_ms
                ));
            }
        };
        quality::parse_quality_response(&reply).ok_or_else(|| {
            tracing::warn!("unparseable credibility assessment reply");
            "assessment reply could not be parsed".to_string()
        })
    }

    /// Assess every open-web item in `items`, writing the overall score and
    /// flags into the item. Non-web items pass through untouched. Order is
    /// preserved.
    pub async fn annotate(&self, items: Vec<SearchResultItem>) -> Vec<SearchResultItem> {
        let limit = self.settings.max_concurrent_assessments.max(1);
        futures_util::stream::iter(items)
            .map(|mut item| async move {
                if item.source_type == SourceType::Web {
                    let score = self.assess(&item).await;
                    item.credibility = Some(score.overall);
                    item.metadata.credibility_flags = score.flags;
                }
                item
            })
            .buffered(limit)
            .collect()
            .await
    }

    /// Like [`annotate`](Self::annotate) but without consulting the model;
    /// every open-web item gets an `unassessed` flag with `reason`.
    pub fn annotate_without_model(
        &self,
        items: Vec<SearchResultItem>,
        reason: &str,
    ) -> Vec<SearchResultItem> {
        items
            .into_iter()
            .map(|mut item| {
                if item.source_type == SourceType::Web {
                    let score = self.assess_without_model(&item, reason);
                    item.credibility = Some(score.overall);
                    item.metadata.credibility_flags = score.flags;
                }
                item
            })
            .collect()
    }
}

fn host_of(raw: &str) -> Option<String> {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CascadeError;
    use async_trait::async_trait;

    struct FixedLlm(&'static str);

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, CascadeError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, CascadeError> {
            Err(CascadeError::Llm("HTTP 500: boom".into()))
        }
    }

    struct SlowLlm;

    #[async_trait]
    impl LlmClient for SlowLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, CascadeError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("1.0".into())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("date")
    }

    fn web(url: &str) -> SearchResultItem {
        SearchResultItem::new("Rada miasta przyjęła budżet", "Treść artykułu", SourceType::Web)
            .with_url(url)
            .with_published_at(NaiveDate::from_ymd_opt(2025, 2, 20))
    }

    fn assessor(llm: Option<Arc<dyn LlmClient>>) -> CredibilityAssessor {
        CredibilityAssessor::new(CredibilitySettings::default(), llm)
    }

    #[tokio::test]
    async fn satire_is_flagged_and_capped_even_with_perfect_quality() {
        let a = assessor(Some(Arc::new(FixedLlm(
            r#"{"quality": 1.0, "factual_accuracy": 1.0, "bias": 0.0}"#,
        ))));
        let score = a.assess_at(&web("https://aszdziennik.pl/123,burmistrz"), today()).await;
        assert!(score.overall < 0.3, "overall = {}", score.overall);
        assert!(score.flags.iter().any(|f| f.flag_type == FlagType::Satire
            && f.severity == Severity::Medium));
    }

    #[tokio::test]
    async fn government_domain_scores_high() {
        let a = assessor(Some(Arc::new(FixedLlm(
            r#"{"quality": 0.9, "factual_accuracy": 0.9, "bias": 0.1}"#,
        ))));
        let score = a.assess_at(&web("https://www.gov.pl/web/finanse"), today()).await;
        assert!(score.overall > 0.85, "overall = {}", score.overall);
        assert!(score.flags.is_empty());
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_neutral() {
        let a = assessor(Some(Arc::new(FailingLlm)));
        let score = a.assess_at(&web("https://blog.example.org/a"), today()).await;
        assert_eq!(score.content_quality, 0.5);
        assert!(score.factual_accuracy.is_none());
        assert!((0.0..=1.0).contains(&score.overall));
        assert!(score.flags.iter().any(|f| f.flag_type == FlagType::Unassessed));
    }

    #[tokio::test]
    async fn malformed_reply_falls_back_to_neutral() {
        let a = assessor(Some(Arc::new(FixedLlm("no idea, sorry"))));
        let score = a.assess_at(&web("https://blog.example.org/a"), today()).await;
        assert_eq!(score.content_quality, 0.5);
        assert!(score.flags.iter().any(|f| f.flag_type == FlagType::Unassessed));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_llm_times_out() {
        let settings = CredibilitySettings {
            llm_timeout_ms: 100,
            ..Default::default()
        };
        let a = CredibilityAssessor::new(settings, Some(Arc::new(SlowLlm)));
        let score = a.assess_at(&web("https://blog.example.org/a"), today()).await;
        assert_eq!(score.content_quality, 0.5);
        assert!(score.flags[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn old_content_is_flagged_outdated() {
        let a = assessor(None);
        let item = web("https://pap.pl/x").with_published_at(NaiveDate::from_ymd_opt(2019, 1, 1));
        let score = a.assess_at(&item, today()).await;
        assert!(score.freshness < 0.5);
        assert!(score.flags.iter().any(|f| f.flag_type == FlagType::Outdated));
    }

    #[tokio::test]
    async fn unreliable_domain_is_fake_news_high() {
        let a = assessor(None);
        let score = a.assess_at(&web("https://www.infowars.com/story"), today()).await;
        assert!(score.overall <= 0.15);
        assert!(score.flags.iter().any(|f| f.flag_type == FlagType::FakeNews
            && f.severity == Severity::High));
    }

    #[tokio::test]
    async fn biased_and_low_quality_flags() {
        let a = assessor(Some(Arc::new(FixedLlm(r#"{"quality": 0.1, "bias": 0.9}"#))));
        let score = a.assess_at(&web("https://blog.example.org/a"), today()).await;
        let kinds: Vec<_> = score.flags.iter().map(|f| f.flag_type).collect();
        assert!(kinds.contains(&FlagType::LowQuality));
        assert!(kinds.contains(&FlagType::Biased));
    }

    #[tokio::test]
    async fn annotate_only_touches_web_items() {
        let a = assessor(None);
        let items = vec![
            SearchResultItem::new("Ustawa", "treść", SourceType::LegalActs),
            web("https://theonion.com/x"),
        ];
        let out = a.annotate(items).await;
        assert!(out[0].credibility.is_none());
        assert!(out[1].credibility.is_some_and(|c| c < 0.3));
        assert_eq!(out[1].metadata.credibility_flags[0].flag_type, FlagType::Satire);
    }

    #[test]
    fn unassessed_annotation_keeps_domain_signals() {
        let a = assessor(Some(Arc::new(FixedLlm("9"))));
        let items = vec![
            SearchResultItem::new("Ustawa", "treść", SourceType::LegalActs),
            web("https://theonion.com/x"),
            web("https://www.gov.pl/web/budzet"),
        ];
        let out = a.annotate_without_model(items, "assessment deadline reached");
        assert!(out[0].credibility.is_none());
        assert!(out[1].credibility.is_some_and(|c| c < 0.3));
        assert!(out[2].credibility > out[1].credibility);
        for item in &out[1..] {
            let unassessed = item
                .metadata
                .credibility_flags
                .iter()
                .find(|f| f.flag_type == FlagType::Unassessed)
                .expect("unassessed flag");
            assert_eq!(unassessed.reason, "assessment deadline reached");
        }
    }

    #[test]
    fn flag_serializes_with_type_key() {
        let flag = CredibilityFlag::new(FlagType::FakeNews, Severity::High, "x");
        let json = serde_json::to_value(&flag).expect("serialize");
        assert_eq!(json["type"], "fake_news");
        assert_eq!(json["severity"], "high");
    }

    #[test]
    fn settings_validation() {
        assert!(CredibilitySettings::default().validate().is_ok());
        let mut s = CredibilitySettings::default();
        s.weights = CredibilityWeights {
            domain: 0.0,
            quality: 0.0,
            factual: 0.0,
            bias: 0.0,
            freshness: 0.0,
        };
        assert!(s.validate().is_err());
        let s = CredibilitySettings {
            low_quality_threshold: 1.5,
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }
}
