//! # civic-search
//!
//! Priority-ordered, early-stopping search across heterogeneous civic
//! information sources: locally indexed council documents, public
//! registries and the open web.
//!
//! ## Design
//!
//! - Sources are grouped by priority; groups run in order, sources within a
//!   group run concurrently under a bound
//! - Results are normalized into [`SearchResultItem`], deduplicated by
//!   canonical URL or title, and ranked deterministically
//! - Open-web items carry a credibility assessment: domain trust, an
//!   optional LLM content-quality estimate and freshness
//! - Claims that recur across independent origins are cross-referenced and
//!   folded into an overall confidence figure
//! - Source failures never fail a query; they are reported per source
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> civic_search::Result<()> {
//! use std::sync::Arc;
//! use civic_search::adapters::{InMemoryIndex, LocalIndexAdapter, SourceRegistry};
//! use civic_search::{CascadeConfig, DocumentRelevanceScorer, SearchCascadeEngine, SearchOptions, SearchQuery};
//!
//! let config = CascadeConfig::default();
//! let index = InMemoryIndex::from_json_file(std::path::Path::new("documents.json"))?;
//! let registry = SourceRegistry::new().with(Arc::new(LocalIndexAdapter::new(
//!     Arc::new(index),
//!     DocumentRelevanceScorer::new(config.documents.clone()),
//! )));
//! let engine = SearchCascadeEngine::from_config(&config, registry, None)?;
//! let response = engine
//!     .search(&SearchQuery::new("sesja XXIII"), &SearchOptions::default())
//!     .await;
//! for item in &response.results {
//!     println!("{:.2} {}", item.relevance, item.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cache;
pub mod cascade;
pub mod config;
pub mod credibility;
pub mod crossref;
pub mod documents;
pub mod error;
pub mod intent;
pub mod llm;
pub mod normalize;
pub mod rank;
pub mod text;
pub mod types;

pub use adapters::{SourceAdapter, SourceRegistry};
pub use cascade::{
    CascadeSettings, SearchCascadeEngine, SearchCascadeResponse, SearchOptions, SourceReport,
    SourceStatus, StopPolicy,
};
pub use config::CascadeConfig;
pub use credibility::{CredibilityAssessor, CredibilityScore};
pub use crossref::{CrossReference, CrossReferencer};
pub use documents::{Document, DocumentRelevanceScorer, DocumentScore};
pub use error::{CascadeError, Result, SourceError};
pub use intent::QueryIntent;
pub use llm::{LlmClient, OpenAiCompatibleClient};
pub use types::{DateRange, SearchQuery, SearchResultItem, SourceConfig, SourceType};
