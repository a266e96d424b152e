//! Retrieval executor: bounded-concurrency fan-out with per-query retry.
//!
//! Every planned query runs independently. A query that keeps failing is
//! recorded as a failed [`QueryResult`]; it never aborts its siblings.
//! Results are re-associated with their query and returned in planning
//! order regardless of completion order.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::cache::QueryCache;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::{ProviderRequest, SearchProvider};
use crate::types::{QueryResult, SearchQuery};

/// Runs planned queries against a [`SearchProvider`].
///
/// The provider is a capability handed in at construction; the executor
/// holds no other shared state apart from its optional result cache.
#[derive(Debug)]
pub struct RetrievalExecutor<P> {
    provider: P,
    config: SearchConfig,
    cache: Option<QueryCache>,
}

impl<P: SearchProvider> RetrievalExecutor<P> {
    /// Create an executor after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid.
    pub fn new(provider: P, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let cache = QueryCache::new(config.cache_ttl_seconds);
        Ok(Self {
            provider,
            config,
            cache,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run every query to completion.
    pub async fn execute(&self, queries: &[SearchQuery]) -> Vec<QueryResult> {
        self.execute_with_cancel(queries, &CancellationToken::new())
            .await
    }

    /// Run every query, abandoning in-flight work once `cancel` fires.
    ///
    /// Queries cancelled before or during execution come back as failed
    /// results; queries that already finished keep their outcome.
    pub async fn execute_with_cancel(
        &self,
        queries: &[SearchQuery],
        cancel: &CancellationToken,
    ) -> Vec<QueryResult> {
        let limit = self.config.concurrency_for(queries.len());
        tracing::debug!(
            provider = self.provider.name(),
            queries = queries.len(),
            limit,
            "starting retrieval batch"
        );

        let mut indexed: Vec<(usize, QueryResult)> = stream::iter(queries.iter().enumerate())
            .map(|(index, query)| async move { (index, self.run_query(query, cancel).await) })
            .buffer_unordered(limit)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<QueryResult> = indexed.into_iter().map(|(_, result)| result).collect();

        let succeeded = results.iter().filter(|r| r.succeeded).count();
        tracing::info!(
            planned = results.len(),
            succeeded,
            failed = results.len() - succeeded,
            "retrieval batch finished"
        );
        results
    }

    /// Run a single query with retry, timeout, cancellation and caching.
    async fn run_query(&self, query: &SearchQuery, cancel: &CancellationToken) -> QueryResult {
        if cancel.is_cancelled() {
            return QueryResult::failure(query.clone(), 0, "cancelled before start");
        }

        if let Some(cache) = &self.cache {
            if let Some(documents) = cache.get(query).await {
                tracing::debug!(query = query.tag(), count = documents.len(), "cache hit");
                return QueryResult::success(query.clone(), documents, 0);
            }
        }

        let request = ProviderRequest::from_query(query, &self.config);
        let policy = &self.config.retry;
        let max_attempts = policy.attempts();
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    Err(SearchError::Cancelled("abandoned during provider call".into()))
                }
                result = tokio::time::timeout(timeout, self.provider.search(&request)) => {
                    result.unwrap_or_else(|_| {
                        Err(SearchError::Timeout(format!(
                            "no response within {}s",
                            self.config.timeout_seconds
                        )))
                    })
                }
            };

            match outcome {
                Ok(response) => {
                    let documents = response.into_documents(query, &self.config);
                    tracing::debug!(
                        query = query.tag(),
                        attempt,
                        count = documents.len(),
                        "query succeeded"
                    );
                    if let Some(cache) = &self.cache {
                        cache.insert(query, documents.clone()).await;
                    }
                    return QueryResult::success(query.clone(), documents, attempt);
                }
                Err(error) => {
                    let retryable = error.is_retryable();
                    tracing::warn!(
                        query = query.tag(),
                        attempt,
                        max_attempts,
                        retryable,
                        error = %error,
                        "provider call failed"
                    );
                    if !retryable || attempt >= max_attempts {
                        return QueryResult::failure(query.clone(), attempt, error.to_string());
                    }
                }
            }

            let delay = policy.delay_for_retry(attempt);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return QueryResult::failure(
                        query.clone(),
                        attempt,
                        "cancelled during retry backoff",
                    );
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
