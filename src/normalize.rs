//! Mapping of raw source hits into [`SearchResultItem`].
//!
//! Every adapter funnels its raw shape through one of these functions so
//! relevance is always in `[0, 1]` and provenance metadata is filled the
//! same way regardless of source.

use civic_web::WebHit;

use crate::adapters::local_index::IndexHit;
use crate::adapters::registry::RegistryRecord;
use crate::documents::DocumentScore;
use crate::types::{DEFAULT_SCORE, SearchResultItem, SourceType};

/// Relevance of an open-web hit from its 0-based page position.
///
/// `1 / (1 + 0.1 · position)`: 1.0 for the first hit, about 0.5 for the tenth.
pub fn position_relevance(position: usize) -> f64 {
    1.0 / (1.0 + position as f64 * 0.1)
}

/// Normalize an open-web hit. Credibility is left unset; the assessor
/// fills it in later.
pub fn web_hit(hit: &WebHit) -> SearchResultItem {
    let mut item = SearchResultItem::new(hit.title.trim(), hit.snippet.trim(), SourceType::Web)
        .with_url(hit.url.clone())
        .with_relevance(position_relevance(hit.position))
        .with_published_at(hit.publish_date);
    item.metadata
        .fields
        .insert("position".into(), serde_json::Value::from(hit.position));
    item
}

/// Normalize a registry (or deep-research) record. Records without a
/// score of their own get [`DEFAULT_SCORE`].
pub fn registry_record(source: SourceType, record: RegistryRecord) -> SearchResultItem {
    let mut item = SearchResultItem::new(record.title.trim(), record.summary.trim(), source)
        .with_relevance(record.score.unwrap_or(DEFAULT_SCORE))
        .with_published_at(record.published_at);
    item.url = record.url;
    item.metadata.source_id = record.id;
    item.metadata.fields = record.fields;
    item
}

/// Normalize a local-index hit together with its document score.
///
/// Relevance is the larger of the index similarity and the scorer's
/// relevance, so a session-number match lifts a document the index ranked
/// low.
pub fn index_hit(hit: IndexHit, score: &DocumentScore) -> SearchResultItem {
    let IndexHit {
        document,
        similarity,
    } = hit;
    let relevance = if similarity.is_nan() {
        score.relevance_score
    } else {
        similarity.max(score.relevance_score)
    };
    let published = document.effective_date().map(|d| d.date_naive());

    let mut item = SearchResultItem::new(document.title, document.content, SourceType::LocalIndex)
        .with_relevance(relevance)
        .with_published_at(published);
    item.url = document.url;
    item.metadata.source_id = Some(document.id);
    item.metadata.session_number = score.scoring_details.document_session;
    item.metadata.document_priority = Some(score.priority);
    item.metadata.fields.insert(
        "category".into(),
        serde_json::to_value(document.category).unwrap_or(serde_json::Value::Null),
    );
    item.metadata.fields.insert(
        "total_score".into(),
        serde_json::Value::from(score.total_score),
    );
    item
}
