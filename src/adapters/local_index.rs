//! Local document index source.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::SourceAdapter;
use crate::documents::{
    Document, DocumentRelevanceScorer, ScoringQuery, document_session, extract_session_number,
};
use crate::error::{CascadeError, SourceError};
use crate::normalize;
use crate::text::{content_words, coverage};
use crate::types::{SearchQuery, SearchResultItem, SourceType};

/// Documents requested from the index per query.
pub const DEFAULT_LIMIT: usize = 20;

/// A raw index match.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub document: Document,
    /// Index-native similarity, expected in `[0, 1]`.
    pub similarity: f64,
}

/// Query interface of the local document store.
#[async_trait]
pub trait LocalIndex: Send + Sync {
    /// Up to `limit` documents matching `text`, best first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<IndexHit>, SourceError>;
}

/// Word-overlap index over documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    documents: Vec<Document>,
}

impl InMemoryIndex {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load a JSON array of documents.
    ///
    /// # Errors
    ///
    /// I/O errors reading the file, or [`CascadeError::Serialization`] if
    /// it is not a document array.
    pub fn from_json_file(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let documents: Vec<Document> = serde_json::from_str(&raw).map_err(|e| {
            CascadeError::Serialization(format!("failed to parse {}: {e}", path.display()))
        })?;
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl LocalIndex for InMemoryIndex {
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<IndexHit>, SourceError> {
        let wanted = content_words(text);
        let session = extract_session_number(text);

        let mut hits: Vec<IndexHit> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let body = format!("{} {} {}", doc.title, doc.keywords.join(" "), doc.content);
                let similarity = coverage(&wanted, &content_words(&body));
                let session_match = session.is_some() && session == document_session(doc);
                (similarity > 0.0 || session_match).then(|| IndexHit {
                    document: doc.clone(),
                    similarity,
                })
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Adapter scoring local-index hits with the document scorer.
pub struct LocalIndexAdapter {
    index: Arc<dyn LocalIndex>,
    scorer: DocumentRelevanceScorer,
    limit: usize,
}

impl LocalIndexAdapter {
    pub fn new(index: Arc<dyn LocalIndex>, scorer: DocumentRelevanceScorer) -> Self {
        Self {
            index,
            scorer,
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl SourceAdapter for LocalIndexAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::LocalIndex
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResultItem>, SourceError> {
        let hits = self.index.query(&query.text, self.limit).await?;
        let parsed = ScoringQuery::new(&query.text).with_session(query.session_number);
        let now = Utc::now();

        let mut items: Vec<SearchResultItem> = hits
            .into_iter()
            .map(|hit| {
                let score = self.scorer.score_at(&hit.document, Some(&parsed), now);
                normalize::index_hit(hit, &score)
            })
            .filter(|item| {
                query
                    .date_range
                    .is_none_or(|range| range.contains(item.metadata.published_at))
            })
            .collect();
        items.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        tracing::debug!(count = items.len(), "local index hits scored");
        Ok(items)
    }
}
