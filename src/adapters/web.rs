//! Open-web source.

use std::sync::Arc;

use async_trait::async_trait;
use civic_web::{WebHit, WebSearchClient};

use super::SourceAdapter;
use crate::cache::{QueryKey, TtlCache};
use crate::error::SourceError;
use crate::normalize;
use crate::types::{SearchQuery, SearchResultItem, SourceType};

/// Raw open-web search transport.
#[async_trait]
pub trait WebSearchTransport: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<WebHit>, SourceError>;
}

#[async_trait]
impl WebSearchTransport for WebSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<WebHit>, SourceError> {
        WebSearchClient::search(self, query).await.map_err(SourceError::from)
    }
}

/// Adapter normalizing open-web hits. Credibility is assessed by the
/// cascade, not here, so cached hits are re-assessed on every query.
pub struct WebAdapter {
    transport: Arc<dyn WebSearchTransport>,
    cache: TtlCache<QueryKey, Vec<WebHit>>,
}

impl WebAdapter {
    pub fn new(transport: Arc<dyn WebSearchTransport>, cache_ttl_secs: u64) -> Self {
        Self {
            transport,
            cache: TtlCache::with_ttl_secs(cache_ttl_secs),
        }
    }
}

#[async_trait]
impl SourceAdapter for WebAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::Web
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResultItem>, SourceError> {
        let key = QueryKey::new(query);
        let hits = match self.cache.get(&key).await {
            Some(hits) => hits,
            None => {
                let hits = self.transport.search(&query.text).await?;
                self.cache.insert(key, hits.clone()).await;
                hits
            }
        };

        Ok(hits
            .iter()
            .map(normalize::web_hit)
            .filter(|item| {
                query
                    .date_range
                    .is_none_or(|range| range.contains(item.metadata.published_at))
            })
            .collect())
    }
}
