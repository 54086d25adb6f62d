//! Source adapters and the registry the cascade dispatches through.
//!
//! Every source kind implements [`SourceAdapter`]: one async `search` that
//! returns normalized items or a source-scoped [`SourceError`]. The engine
//! never matches on concrete adapters; it looks them up by [`SourceType`]
//! in a [`SourceRegistry`].

pub mod local_index;
pub mod registry;
pub mod web;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{SearchQuery, SearchResultItem, SourceType};

pub use local_index::{InMemoryIndex, IndexHit, LocalIndex, LocalIndexAdapter};
pub use registry::{RegistryAdapter, RegistryClient, RegistryQuery, RegistryRecord};
pub use web::{WebAdapter, WebSearchTransport};

/// A queryable source.
///
/// Implementations must be `Send + Sync`; the cascade calls several
/// adapters of one priority group concurrently.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The source kind this adapter serves.
    fn source_type(&self) -> SourceType;

    /// Run `query` against the source.
    ///
    /// # Errors
    ///
    /// Any [`SourceError`]; the cascade records it against this source
    /// and carries on.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResultItem>, SourceError>;
}

/// Lookup table from source kind to adapter.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: HashMap<SourceType, Arc<dyn SourceAdapter>>,
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.source_types())
            .finish()
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under its own source type, returning any adapter
    /// it replaces.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.insert(adapter.source_type(), adapter)
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Adapter for `source`, if registered.
    pub fn get(&self, source: SourceType) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&source).cloned()
    }

    pub fn contains(&self, source: SourceType) -> bool {
        self.adapters.contains_key(&source)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Registered source types, sorted.
    pub fn source_types(&self) -> Vec<SourceType> {
        let mut types: Vec<SourceType> = self.adapters.keys().copied().collect();
        types.sort();
        types
    }
}
