//! Integration tests for the search cascade.
//!
//! Every source is a scripted in-process adapter (no network calls), so the
//! tests exercise grouping, early stopping, timeouts, the circuit breaker,
//! deduplication, credibility and cross-referencing end to end.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use civic_search::adapters::{InMemoryIndex, LocalIndexAdapter, SourceAdapter, SourceRegistry};
use civic_search::cascade::CircuitBreakerSettings;
use civic_search::credibility::{CredibilitySettings, FlagType, Severity};
use civic_search::crossref::ClaimStatus;
use civic_search::documents::{Document, DocumentCategory, DocumentScoringSettings};
use civic_search::llm::LlmClient;
use civic_search::{
    CascadeError, CascadeSettings, CredibilityAssessor, DocumentRelevanceScorer, QueryIntent,
    SearchCascadeEngine, SearchOptions, SearchQuery, SearchResultItem, SourceConfig, SourceError,
    SourceStatus, SourceType, StopPolicy,
};

enum Outcome {
    Items(Vec<SearchResultItem>),
    Fail,
}

struct Scripted {
    source: SourceType,
    outcome: Outcome,
    delay: Duration,
    calls: AtomicUsize,
}

impl Scripted {
    fn items(source: SourceType, items: Vec<SearchResultItem>) -> Arc<Self> {
        Arc::new(Self {
            source,
            outcome: Outcome::Items(items),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(source: SourceType) -> Arc<Self> {
        Arc::new(Self {
            source,
            outcome: Outcome::Fail,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(source: SourceType, delay: Duration, items: Vec<SearchResultItem>) -> Arc<Self> {
        Arc::new(Self {
            source,
            outcome: Outcome::Items(items),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for Scripted {
    fn source_type(&self) -> SourceType {
        self.source
    }

    async fn search(&self, _query: &SearchQuery) -> Result<Vec<SearchResultItem>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.outcome {
            Outcome::Items(items) => Ok(items.clone()),
            Outcome::Fail => Err(SourceError::Http("connection refused".into())),
        }
    }
}

struct PerfectLlm;

#[async_trait]
impl LlmClient for PerfectLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, CascadeError> {
        Ok(r#"{"quality": 1.0, "factual_accuracy": 1.0, "bias": 0.0}"#.into())
    }
}

fn item(source: SourceType, title: &str) -> SearchResultItem {
    SearchResultItem::new(title, format!("Treść: {title}"), source)
}

fn engine_with(
    adapters: Vec<Arc<Scripted>>,
    sources: Vec<SourceConfig>,
    settings: CascadeSettings,
) -> SearchCascadeEngine {
    let mut registry = SourceRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    SearchCascadeEngine::new(registry, sources, settings).expect("valid engine")
}

fn statuses(response: &civic_search::SearchCascadeResponse) -> Vec<(SourceType, SourceStatus)> {
    response
        .sources_queried
        .iter()
        .map(|r| (r.source, r.status))
        .collect()
}

#[tokio::test]
async fn early_stop_skips_later_groups() {
    let local = Scripted::items(
        SourceType::LocalIndex,
        vec![
            item(SourceType::LocalIndex, "Uchwała nr 1"),
            item(SourceType::LocalIndex, "Uchwała nr 2"),
            item(SourceType::LocalIndex, "Uchwała nr 3"),
        ],
    );
    let legal = Scripted::items(SourceType::LegalActs, vec![item(SourceType::LegalActs, "Ustawa")]);
    let stats = Scripted::items(SourceType::Statistics, vec![item(SourceType::Statistics, "GUS")]);
    let engine = engine_with(
        vec![local.clone(), legal.clone(), stats.clone()],
        vec![
            SourceConfig::new(SourceType::LocalIndex, 0).with_min_results(100),
            SourceConfig::new(SourceType::LegalActs, 1).with_min_results(100),
            SourceConfig::new(SourceType::Statistics, 2).with_min_results(100),
        ],
        CascadeSettings::default(),
    );

    let response = engine
        .search(&SearchQuery::new("uchwała"), &SearchOptions::default().stop_after(3))
        .await;

    assert_eq!(
        statuses(&response),
        vec![
            (SourceType::LocalIndex, SourceStatus::Succeeded),
            (SourceType::LegalActs, SourceStatus::Skipped),
            (SourceType::Statistics, SourceStatus::Skipped),
        ]
    );
    assert_eq!(response.stopped_at, Some(0));
    assert!(!response.exhausted);
    assert!(response.success);
    assert_eq!(response.results.len(), 3);
    assert_eq!((legal.calls(), stats.calls()), (0, 0));
    assert!(
        response
            .sources_queried
            .iter()
            .all(|r| r.error.is_none())
    );
}

#[tokio::test]
async fn exhaustive_query_runs_every_group() {
    let local = Scripted::items(
        SourceType::LocalIndex,
        (1..=5)
            .map(|n| item(SourceType::LocalIndex, &format!("Protokół {n}")))
            .collect(),
    );
    let legal = Scripted::items(SourceType::LegalActs, vec![item(SourceType::LegalActs, "Ustawa")]);
    let engine = engine_with(
        vec![local, legal.clone()],
        vec![
            SourceConfig::new(SourceType::LocalIndex, 0),
            SourceConfig::new(SourceType::LegalActs, 1),
        ],
        CascadeSettings::default(),
    );

    let response = engine
        .search(&SearchQuery::new("protokół").exhaustive(true), &SearchOptions::default())
        .await;

    assert_eq!(legal.calls(), 1);
    assert!(response.exhausted);
    assert_eq!(response.stopped_at, None);
    assert_eq!(response.results.len(), 6);
    assert_eq!(
        response.sources_with_results,
        vec![SourceType::LocalIndex, SourceType::LegalActs]
    );
}

#[tokio::test]
async fn source_threshold_uses_minimum_across_responders() {
    let local = Scripted::items(
        SourceType::LocalIndex,
        vec![
            item(SourceType::LocalIndex, "A"),
            item(SourceType::LocalIndex, "B"),
        ],
    );
    let legal = Scripted::items(SourceType::LegalActs, vec![item(SourceType::LegalActs, "C")]);
    let stats = Scripted::items(SourceType::Statistics, vec![item(SourceType::Statistics, "D")]);
    let sources = vec![
        SourceConfig::new(SourceType::LocalIndex, 0).with_min_results(10),
        SourceConfig::new(SourceType::LegalActs, 1).with_min_results(3),
        SourceConfig::new(SourceType::Statistics, 2),
    ];
    let engine = engine_with(vec![local, legal, stats.clone()], sources.clone(), CascadeSettings::default());

    let response = engine.search(&SearchQuery::new("x"), &SearchOptions::default()).await;
    assert_eq!(response.stopped_at, Some(1));
    assert_eq!(stats.calls(), 0);

    // The same table never stops when only the caller may stop it.
    let local = Scripted::items(SourceType::LocalIndex, vec![item(SourceType::LocalIndex, "A")]);
    let legal = Scripted::items(SourceType::LegalActs, vec![item(SourceType::LegalActs, "C")]);
    let stats = Scripted::items(SourceType::Statistics, vec![item(SourceType::Statistics, "D")]);
    let engine = engine_with(vec![local, legal, stats.clone()], sources, CascadeSettings::default());
    let response = engine
        .search(
            &SearchQuery::new("x"),
            &SearchOptions::default().with_stop_policy(StopPolicy::CallerOnly),
        )
        .await;
    assert!(response.exhausted);
    assert_eq!(stats.calls(), 1);
}

#[tokio::test]
async fn duplicate_urls_merge_and_keep_provenance() {
    let legal = Scripted::items(
        SourceType::LegalActs,
        vec![
            item(SourceType::LegalActs, "Uchwała budżetowa")
                .with_url("https://Example.gov.pl/uchwala/12/")
                .with_relevance(0.6),
        ],
    );
    let stats = Scripted::items(
        SourceType::Statistics,
        vec![
            item(SourceType::Statistics, "Uchwała budżetowa 2025")
                .with_url("https://example.gov.pl/uchwala/12?utm_source=newsletter")
                .with_relevance(0.9),
        ],
    );
    let engine = engine_with(
        vec![legal, stats],
        vec![
            SourceConfig::new(SourceType::LegalActs, 1),
            SourceConfig::new(SourceType::Statistics, 1),
        ],
        CascadeSettings::default(),
    );

    let response = engine.search(&SearchQuery::new("budżet"), &SearchOptions::default()).await;

    assert_eq!(response.results.len(), 1);
    let merged = &response.results[0];
    assert_eq!(merged.source_type, SourceType::Statistics);
    assert_eq!(merged.relevance, 0.9);
    let contributors = &merged.metadata.contributing_sources;
    assert!(contributors.contains(&SourceType::LegalActs));
    assert!(contributors.contains(&SourceType::Statistics));
}

#[tokio::test]
async fn repeated_queries_produce_identical_order() {
    let build = || {
        engine_with(
            vec![
                Scripted::items(
                    SourceType::LegalActs,
                    vec![
                        item(SourceType::LegalActs, "Ustawa o finansach"),
                        item(SourceType::LegalActs, "Ustawa o samorządzie"),
                    ],
                ),
                Scripted::items(
                    SourceType::Statistics,
                    vec![
                        item(SourceType::Statistics, "Dochody gmin"),
                        item(SourceType::Statistics, "Ludność gmin"),
                    ],
                ),
            ],
            vec![
                SourceConfig::new(SourceType::LegalActs, 1),
                SourceConfig::new(SourceType::Statistics, 1),
            ],
            CascadeSettings::default(),
        )
    };
    let engine = build();
    let query = SearchQuery::new("gmina").exhaustive(true);
    let first = engine.search(&query, &SearchOptions::default()).await;
    let second = build().search(&query, &SearchOptions::default()).await;

    assert_eq!(first.results, second.results);
    let titles: Vec<&str> = first.results.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Ustawa o finansach",
            "Ustawa o samorządzie",
            "Dochody gmin",
            "Ludność gmin"
        ]
    );
}

#[tokio::test]
async fn all_sources_failing_yields_well_formed_response() {
    let engine = engine_with(
        vec![
            Scripted::failing(SourceType::LegalActs),
            Scripted::failing(SourceType::Web),
        ],
        vec![
            SourceConfig::new(SourceType::LegalActs, 1),
            SourceConfig::new(SourceType::Web, 3),
        ],
        CascadeSettings::default(),
    );

    let response = engine.search(&SearchQuery::new("cokolwiek"), &SearchOptions::default()).await;

    assert!(!response.success);
    assert!(response.results.is_empty());
    assert_eq!(response.overall_confidence, 0.0);
    assert!(response.exhausted);
    assert_eq!(
        statuses(&response),
        vec![
            (SourceType::LegalActs, SourceStatus::Failed),
            (SourceType::Web, SourceStatus::Failed),
        ]
    );
    assert_eq!(
        response.sources_queried[0].error.as_deref(),
        Some("HTTP error: connection refused")
    );
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_without_affecting_siblings() {
    let slow = Scripted::slow(
        SourceType::LegalActs,
        Duration::from_secs(10),
        vec![item(SourceType::LegalActs, "Za późno")],
    );
    let fast = Scripted::items(SourceType::Statistics, vec![item(SourceType::Statistics, "Na czas")]);
    let engine = engine_with(
        vec![slow, fast],
        vec![
            SourceConfig::new(SourceType::LegalActs, 1).with_timeout_ms(100),
            SourceConfig::new(SourceType::Statistics, 1),
        ],
        CascadeSettings::default(),
    );

    let response = engine.search(&SearchQuery::new("x"), &SearchOptions::default()).await;

    assert_eq!(
        statuses(&response),
        vec![
            (SourceType::LegalActs, SourceStatus::TimedOut),
            (SourceType::Statistics, SourceStatus::Succeeded),
        ]
    );
    assert_eq!(
        response.sources_queried[0].error.as_deref(),
        Some("timed out after 100 ms")
    );
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].title, "Na czas");
    assert!(response.success);
    assert!(!response.deadline_exceeded);
}

#[tokio::test(start_paused = true)]
async fn overall_deadline_returns_partial_response() {
    let slow = Scripted::slow(
        SourceType::LocalIndex,
        Duration::from_secs(5),
        vec![item(SourceType::LocalIndex, "Za późno")],
    );
    let later = Scripted::items(SourceType::LegalActs, vec![item(SourceType::LegalActs, "Ustawa")]);
    let engine = engine_with(
        vec![slow, later.clone()],
        vec![
            SourceConfig::new(SourceType::LocalIndex, 0).with_timeout_ms(10_000),
            SourceConfig::new(SourceType::LegalActs, 1),
        ],
        CascadeSettings::default(),
    );

    let response = engine
        .search(
            &SearchQuery::new("x"),
            &SearchOptions::default().with_deadline(Duration::from_secs(1)),
        )
        .await;

    assert!(response.deadline_exceeded);
    assert!(!response.exhausted);
    assert!(!response.success);
    assert_eq!(later.calls(), 0);
    assert_eq!(
        statuses(&response),
        vec![
            (SourceType::LocalIndex, SourceStatus::TimedOut),
            (SourceType::LegalActs, SourceStatus::Skipped),
        ]
    );
}

#[tokio::test]
async fn circuit_opens_after_consecutive_failures() {
    let flaky = Scripted::failing(SourceType::Spatial);
    let engine = engine_with(
        vec![flaky.clone()],
        vec![SourceConfig::new(SourceType::Spatial, 2)],
        CascadeSettings {
            circuit_breaker: CircuitBreakerSettings {
                failure_threshold: 2,
                cooldown_secs: 60,
            },
            ..Default::default()
        },
    );
    let query = SearchQuery::new("działka 12/3");

    for _ in 0..2 {
        let response = engine.search(&query, &SearchOptions::default()).await;
        assert_eq!(response.sources_queried[0].status, SourceStatus::Failed);
    }
    let response = engine.search(&query, &SearchOptions::default()).await;

    assert_eq!(flaky.calls(), 2);
    assert_eq!(response.sources_queried[0].status, SourceStatus::CircuitOpen);
    assert_eq!(
        response.sources_queried[0].error.as_deref(),
        Some("circuit open after 2 consecutive failures")
    );
    assert!(!response.success);
    assert_eq!(
        engine.circuit_state(SourceType::Spatial),
        civic_search::cascade::CircuitState::Open
    );
}

#[tokio::test]
async fn satire_hit_is_flagged_and_scored_low() {
    let web = Scripted::items(
        SourceType::Web,
        vec![
            SearchResultItem::new(
                "Burmistrz sprzedał ratusz na aukcji",
                "Burmistrz wystawił ratusz na aukcję internetową.",
                SourceType::Web,
            )
            .with_url("https://aszdziennik.pl/12345,burmistrz-ratusz")
            .with_relevance(1.0),
        ],
    );
    let engine = engine_with(
        vec![web],
        vec![SourceConfig::new(SourceType::Web, 3)],
        CascadeSettings::default(),
    )
    .with_assessor(CredibilityAssessor::new(
        CredibilitySettings::default(),
        Some(Arc::new(PerfectLlm)),
    ));

    let response = engine.search(&SearchQuery::new("ratusz"), &SearchOptions::default()).await;

    let hit = &response.results[0];
    let credibility = hit.credibility.expect("web items are assessed");
    assert!(credibility < 0.3, "satire scored {credibility}");
    assert!(
        hit.metadata
            .credibility_flags
            .iter()
            .any(|f| f.flag_type == FlagType::Satire && f.severity == Severity::Medium)
    );
}

#[tokio::test]
async fn web_credibility_floor_drops_weak_items() {
    let web = Scripted::items(
        SourceType::Web,
        vec![
            SearchResultItem::new("Satyra", "Tekst satyryczny.", SourceType::Web)
                .with_url("https://aszdziennik.pl/1"),
            SearchResultItem::new("Komunikat", "Komunikat urzędu.", SourceType::Web)
                .with_url("https://www.gov.pl/web/komunikat"),
        ],
    );
    let engine = engine_with(
        vec![web],
        vec![SourceConfig::new(SourceType::Web, 3)],
        CascadeSettings {
            min_web_credibility: Some(0.5),
            ..Default::default()
        },
    );

    let response = engine.search(&SearchQuery::new("komunikat"), &SearchOptions::default()).await;

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].title, "Komunikat");
    assert_eq!(response.sources_queried[0].result_count, 2);
}

#[tokio::test]
async fn source_emptied_by_credibility_floor_does_not_count_as_responder() {
    let web = Scripted::items(
        SourceType::Web,
        vec![
            SearchResultItem::new("Satyra", "Tekst satyryczny.", SourceType::Web)
                .with_url("https://aszdziennik.pl/1"),
        ],
    );
    let local = Scripted::items(
        SourceType::LocalIndex,
        vec![item(SourceType::LocalIndex, "Uchwała budżetowa")],
    );
    let legal = Scripted::items(SourceType::LegalActs, vec![item(SourceType::LegalActs, "Ustawa")]);
    let engine = engine_with(
        vec![web, local, legal.clone()],
        vec![
            SourceConfig::new(SourceType::Web, 0).with_min_results(1),
            SourceConfig::new(SourceType::LocalIndex, 1).with_min_results(3),
            SourceConfig::new(SourceType::LegalActs, 2),
        ],
        CascadeSettings {
            min_web_credibility: Some(0.5),
            ..Default::default()
        },
    );

    let response = engine.search(&SearchQuery::new("budżet"), &SearchOptions::default()).await;

    assert_eq!(response.sources_queried[0].result_count, 1);
    assert_eq!(
        response.sources_with_results,
        vec![SourceType::LocalIndex, SourceType::LegalActs]
    );
    assert_eq!(legal.calls(), 1);
    assert!(response.results.iter().all(|r| r.source_type != SourceType::Web));
}

#[tokio::test(start_paused = true)]
async fn slow_assessment_is_cut_off_at_overall_deadline() {
    struct SlowLlm;

    #[async_trait]
    impl LlmClient for SlowLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, CascadeError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(r#"{"quality": 1.0, "factual_accuracy": 1.0, "bias": 0.0}"#.into())
        }
    }

    let hits = (0..8)
        .map(|i| {
            SearchResultItem::new(format!("Komunikat {i}"), "Komunikat urzędu.", SourceType::Web)
                .with_url(format!("https://www.gov.pl/web/komunikat-{i}"))
        })
        .collect();
    let web = Scripted::items(SourceType::Web, hits);
    let engine = engine_with(
        vec![web],
        vec![SourceConfig::new(SourceType::Web, 0)],
        CascadeSettings::default(),
    )
    .with_assessor(CredibilityAssessor::new(
        CredibilitySettings {
            llm_timeout_ms: 60_000,
            ..Default::default()
        },
        Some(Arc::new(SlowLlm)),
    ));

    let started = tokio::time::Instant::now();
    let response = engine
        .search(
            &SearchQuery::new("komunikat"),
            &SearchOptions::default().with_deadline(Duration::from_secs(1)),
        )
        .await;

    assert!(started.elapsed() <= Duration::from_millis(1_100));
    assert!(response.total_latency_ms <= 1_100);
    assert!(response.deadline_exceeded);
    assert!(!response.exhausted);
    assert_eq!(response.results.len(), 8);
    assert_eq!(response.sources_with_results, vec![SourceType::Web]);
    for hit in &response.results {
        assert!(hit.credibility.is_some());
        assert!(
            hit.metadata
                .credibility_flags
                .iter()
                .any(|f| f.flag_type == FlagType::Unassessed)
        );
    }
}

#[tokio::test]
async fn contradicted_claim_lowers_confidence() {
    let claim = "Rada miasta uchwaliła budżet gminy na rok 2025.";
    let negated = "Rada miasta nie uchwaliła budżet gminy na rok 2025.";
    let sourced = |host: &str, text: &str| {
        SearchResultItem::new(format!("Wiadomość z {host}"), text, SourceType::LocalIndex)
            .with_url(format!("https://{host}/budzet"))
    };
    let supporting = vec![
        sourced("a.example.pl", claim),
        sourced("b.example.pl", claim),
        sourced("c.example.pl", claim),
    ];
    let mut disputed = supporting.clone();
    disputed.push(sourced("d.example.pl", negated));

    let run = |items: Vec<SearchResultItem>| async move {
        engine_with(
            vec![Scripted::items(SourceType::LocalIndex, items)],
            vec![SourceConfig::new(SourceType::LocalIndex, 0)],
            CascadeSettings::default(),
        )
        .search(&SearchQuery::new("budżet"), &SearchOptions::default())
        .await
    };

    let agreed = run(supporting).await;
    let contested = run(disputed).await;

    assert_eq!(agreed.cross_references.len(), 1);
    assert_eq!(agreed.cross_references[0].status, ClaimStatus::Corroborated);

    assert_eq!(contested.cross_references.len(), 1);
    let reference = &contested.cross_references[0];
    assert_eq!(reference.status, ClaimStatus::Disputed);
    assert!((reference.confidence - 0.75).abs() < 1e-9);
    assert_eq!(reference.supporting_sources.len(), 3);
    assert_eq!(reference.contradicting_sources, vec!["d.example.pl".to_string()]);
    assert!(contested.overall_confidence < agreed.overall_confidence);
}

#[tokio::test]
async fn roman_session_query_tops_local_results() {
    let index = InMemoryIndex::new(vec![
        Document::new("d1", "Sesja Nr XXII", DocumentCategory::SessionProtocol)
            .with_content("Protokół z obrad XXII sesji Rady Miejskiej."),
        Document::new("d2", "Ogłoszenie o przetargu", DocumentCategory::Announcement)
            .with_content("Przetarg na dostawę sprzętu."),
        Document::new("d3", "Sesja Nr XXIII", DocumentCategory::SessionProtocol)
            .with_content("Protokół z obrad XXIII sesji Rady Miejskiej."),
    ]);
    let adapter = LocalIndexAdapter::new(
        Arc::new(index),
        DocumentRelevanceScorer::new(DocumentScoringSettings::default()),
    );
    let registry = SourceRegistry::new().with(Arc::new(adapter));
    let engine = SearchCascadeEngine::new(
        registry,
        vec![SourceConfig::new(SourceType::LocalIndex, 0)],
        CascadeSettings::default(),
    )
    .expect("engine");

    let response = engine
        .search(&SearchQuery::new("sesja nr XXIII"), &SearchOptions::default())
        .await;

    let top = &response.results[0];
    assert_eq!(top.title, "Sesja Nr XXIII");
    assert_eq!(top.metadata.session_number, Some(23));
    assert!(top.relevance > 0.95, "relevance {}", top.relevance);
    assert!(response.results.iter().all(|i| i.title != "Ogłoszenie o przetargu"));
}

#[tokio::test]
async fn intent_routing_limits_sources_and_is_reported() {
    let adapters: Vec<Arc<Scripted>> = SourceType::all()
        .iter()
        .map(|s| Scripted::items(*s, vec![item(*s, s.name())]))
        .collect();
    let engine = engine_with(
        adapters,
        civic_search::config::default_sources(),
        CascadeSettings {
            intent_routing: true,
            ..Default::default()
        },
    );

    let response = engine
        .search(&SearchQuery::new("KRS spółki komunalnej").exhaustive(true), &SearchOptions::default())
        .await;

    assert_eq!(response.intent, Some(QueryIntent::BusinessLookup));
    let queried: Vec<SourceType> = response.sources_queried.iter().map(|r| r.source).collect();
    assert_eq!(queried, vec![SourceType::BusinessRegistry, SourceType::Web]);
}
