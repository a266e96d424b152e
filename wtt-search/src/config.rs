//! Retrieval configuration with sensible defaults.
//!
//! [`SearchConfig`] controls the provider endpoint, per-call limits,
//! concurrency, caching and the per-query [`RetryPolicy`]. It deserializes
//! from the `[search]` table of the application config.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::retry::RetryPolicy;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "TAVILY_API_KEY";

/// Default provider endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Configuration for the retrieval executor and HTTP provider.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider API key. Falls back to `TAVILY_API_KEY` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Provider base URL (no trailing `/search`).
    pub base_url: String,
    /// Maximum number of results requested per query.
    pub max_results: usize,
    /// Per-attempt HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Ask the provider for the original page content as well as the snippet.
    pub include_raw_content: bool,
    /// Maximum queries in flight. `None` runs every planned query at once.
    pub max_concurrency: Option<usize>,
    /// Characters kept from each document's normalised content.
    pub max_content_chars: usize,
    /// How long successful query results stay cached, in seconds. 0 disables.
    pub cache_ttl_seconds: u64,
    /// Custom User-Agent. Defaults to `wtt/<version>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Per-query retry policy.
    pub retry: RetryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            max_results: 3,
            timeout_seconds: 10,
            include_raw_content: true,
            max_concurrency: None,
            max_content_chars: crate::content::DEFAULT_MAX_CHARS,
            cache_ttl_seconds: 600,
            user_agent: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `max_concurrency`, when set, must be greater than 0
    /// - `base_url` must parse as an absolute URL
    /// - the retry policy must be well formed
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(SearchError::Config(
                "max_concurrency must be greater than 0".into(),
            ));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(SearchError::Config(format!(
                "base_url is not a valid URL: {}",
                self.base_url
            )));
        }
        self.retry
            .validate()
            .map_err(|e| SearchError::Config(format!("retry: {e}")))?;
        Ok(())
    }

    /// Resolve the API key from config, then from [`API_KEY_ENV`].
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Effective concurrency limit for a batch of `query_count` queries.
    pub fn concurrency_for(&self, query_count: usize) -> usize {
        let all = query_count.max(1);
        self.max_concurrency.map_or(all, |limit| limit.min(all))
    }
}
