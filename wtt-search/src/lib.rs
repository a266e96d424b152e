//! # wtt-search
//!
//! Concurrent multi-query web retrieval for WTT token research.
//!
//! A research run plans several [`SearchQuery`]s (technical, documentation,
//! market, news) and hands them to a [`RetrievalExecutor`], which runs them
//! against a [`SearchProvider`] with bounded concurrency and per-query retry.
//!
//! ## Design
//!
//! - One provider call per attempt; retry, timeout and cancellation live in the executor
//! - A failing query becomes a failed [`QueryResult`] and never aborts its siblings
//! - Results come back in planning order regardless of completion order
//! - Raw page content is normalised (HTML boilerplate stripped, whitespace collapsed)
//! - Optional per-executor TTL cache for successful queries
//!
//! ## Security
//!
//! - The API key is read from config or `TAVILY_API_KEY` and never logged
//! - Query text is logged only at debug/trace level

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod executor;
pub mod http;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod types;
pub mod url_normalize;

pub use config::SearchConfig;
pub use error::{ErrorKind, Result, SearchError};
pub use executor::RetrievalExecutor;
pub use provider::{ProviderHit, ProviderRequest, ProviderResponse, SearchProvider};
pub use providers::TavilyProvider;
pub use retry::RetryPolicy;
pub use types::{QueryResult, SearchQuery, SourceDocument, Topic};

/// Run `queries` against the configured Tavily endpoint.
///
/// Convenience wrapper that builds a [`TavilyProvider`] and a
/// [`RetrievalExecutor`] from `config` for a single batch.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the configuration is invalid or no
/// API key is available. Individual query failures are reported inside the
/// returned [`QueryResult`]s, not as an error.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> wtt_search::Result<()> {
/// let config = wtt_search::SearchConfig::default();
/// let queries = [wtt_search::SearchQuery::new("ExampleCoin whitepaper", "documentation")];
/// for result in wtt_search::execute(&queries, &config).await? {
///     println!("{}: {} documents", result.query.tag(), result.documents.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn execute(queries: &[SearchQuery], config: &SearchConfig) -> Result<Vec<QueryResult>> {
    config.validate()?;
    let provider = TavilyProvider::new(config)?;
    let executor = RetrievalExecutor::new(provider, config.clone())?;
    Ok(executor.execute(queries).await)
}
