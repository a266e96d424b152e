//! In-memory TTL cache for successful query documents.
//!
//! Each [`RetrievalExecutor`](crate::executor::RetrievalExecutor) owns its
//! own [`QueryCache`]; there is no process-wide instance. Only successful
//! results are cached, so a failed query is always retried on the next run.
//! Uses [`moka`] for async-friendly caching with automatic eviction.

use std::time::Duration;

use moka::future::Cache;

use crate::types::{SearchQuery, SourceDocument, Topic};

/// Maximum number of cached query result sets.
const MAX_CACHE_ENTRIES: u64 = 256;

/// Cache key: everything about a query that changes what the provider returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed query text.
    text: String,
    topic: Topic,
    days: u32,
    /// Sorted domain filter (empty when unfiltered).
    domains: Vec<String>,
}

impl CacheKey {
    /// Build a deterministic key for a planned query.
    ///
    /// The provenance tag is deliberately excluded: two facets issuing the
    /// same text share the cached documents (re-tagged on the way out).
    pub fn new(query: &SearchQuery) -> Self {
        Self {
            text: query.text().trim().to_lowercase(),
            topic: query.topic(),
            days: query.recency_window_days(),
            domains: query
                .domain_filter()
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

/// TTL cache from [`CacheKey`] to retrieved documents.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<CacheKey, Vec<SourceDocument>>,
}

impl QueryCache {
    /// Create a cache whose entries expire after `ttl_seconds`.
    ///
    /// Returns `None` when `ttl_seconds` is 0 (caching disabled).
    pub fn new(ttl_seconds: u64) -> Option<Self> {
        if ttl_seconds == 0 {
            return None;
        }
        Some(Self {
            inner: Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build(),
        })
    }

    /// Cached documents for `query`, re-tagged with the query's provenance.
    pub async fn get(&self, query: &SearchQuery) -> Option<Vec<SourceDocument>> {
        let docs = self.inner.get(&CacheKey::new(query)).await?;
        Some(
            docs.into_iter()
                .map(|doc| doc.with_origin(query.tag()))
                .collect(),
        )
    }

    /// Store documents for `query`.
    pub async fn insert(&self, query: &SearchQuery, documents: Vec<SourceDocument>) {
        self.inner.insert(CacheKey::new(query), documents).await;
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
