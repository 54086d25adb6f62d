//! Per-adapter TTL cache.
//!
//! A thin wrapper over [`moka::future::Cache`] so every adapter owns its
//! own cache, constructed with an explicit TTL and capacity. A TTL of zero
//! disables caching entirely.

use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache;

use crate::types::SearchQuery;

/// Default number of entries held by an adapter cache.
pub const DEFAULT_CAPACITY: u64 = 256;

/// Bounded cache whose entries expire `ttl` after insertion.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Option<Cache<K, V>>,
}

impl<K, V> std::fmt::Debug for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with the given TTL and capacity.
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        if ttl.is_zero() || capacity == 0 {
            return Self::disabled();
        }
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner: Some(inner) }
    }

    /// Create a cache with the given TTL in seconds and default capacity.
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs), DEFAULT_CAPACITY)
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether lookups can ever hit.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Fetch a live entry.
    pub async fn get(&self, key: &K) -> Option<V> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    /// Store an entry.
    pub async fn insert(&self, key: K, value: V) {
        if let Some(cache) = &self.inner {
            cache.insert(key, value).await;
        }
    }
}

/// Cache key for a query: normalised text plus the hints that change
/// what a source returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    text: String,
    session: Option<u32>,
    window: Option<(Option<chrono::NaiveDate>, Option<chrono::NaiveDate>)>,
}

impl QueryKey {
    /// Build a key: text lowercased and whitespace-collapsed.
    pub fn new(query: &SearchQuery) -> Self {
        let text = query
            .text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            session: query.session_number,
            window: query.date_range.map(|r| (r.from, r.to)),
        }
    }
}
