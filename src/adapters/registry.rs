//! Public-registry sources (statistics, legal acts, business registry,
//! spatial) and the deep-research source.
//!
//! Each registry's wire protocol lives behind [`RegistryClient`]; this
//! adapter only builds the request, caches responses and normalizes
//! records.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SourceAdapter;
use crate::cache::{QueryKey, TtlCache};
use crate::error::SourceError;
use crate::normalize;
use crate::types::{DateRange, SearchQuery, SearchResultItem, SourceType};

/// Records requested from a registry per query.
pub const DEFAULT_LIMIT: usize = 10;

/// Parameters handed to a registry client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryQuery {
    pub text: String,
    pub session_number: Option<u32>,
    pub date_range: Option<DateRange>,
    pub limit: usize,
}

/// One raw registry record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryRecord {
    /// Registry-native identifier (act number, KRS, TERYT code...).
    pub id: Option<String>,
    pub title: String,
    pub summary: String,
    pub url: Option<String>,
    /// Registry-native score, if it ranks results.
    pub score: Option<f64>,
    pub published_at: Option<NaiveDate>,
    /// Structured payload kept verbatim in item metadata.
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Client for one registry API.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Search the registry.
    async fn search(&self, params: &RegistryQuery) -> Result<Vec<RegistryRecord>, SourceError>;
}

/// Adapter serving one registry-like [`SourceType`].
pub struct RegistryAdapter {
    source: SourceType,
    client: Arc<dyn RegistryClient>,
    cache: TtlCache<QueryKey, Vec<RegistryRecord>>,
    limit: usize,
}

impl RegistryAdapter {
    /// Wrap `client` as the adapter for `source`, caching responses for
    /// `cache_ttl_secs` (0 disables the cache).
    pub fn new(source: SourceType, client: Arc<dyn RegistryClient>, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            client,
            cache: TtlCache::with_ttl_secs(cache_ttl_secs),
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
impl SourceAdapter for RegistryAdapter {
    fn source_type(&self) -> SourceType {
        self.source
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResultItem>, SourceError> {
        let key = QueryKey::new(query);
        let records = match self.cache.get(&key).await {
            Some(records) => {
                tracing::debug!(source = %self.source, "registry cache hit");
                records
            }
            None => {
                let params = RegistryQuery {
                    text: query.text.clone(),
                    session_number: query.session_number,
                    date_range: query.date_range,
                    limit: self.limit,
                };
                let records = self.client.search(&params).await?;
                self.cache.insert(key, records.clone()).await;
                records
            }
        };

        Ok(records
            .into_iter()
            .map(|record| normalize::registry_record(self.source, record))
            .filter(|item| {
                query
                    .date_range
                    .is_none_or(|range| range.contains(item.metadata.published_at))
            })
            .collect())
    }
}
