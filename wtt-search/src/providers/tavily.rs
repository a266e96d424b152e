//! Tavily-compatible HTTP search provider.
//!
//! Sends `POST {base_url}/search` with a bearer API key and a JSON body
//! built from [`ProviderRequest`]. Any endpoint speaking the same shape
//! (including a local mock) can be targeted through `base_url`.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http::build_client;
use crate::provider::{ProviderRequest, ProviderResponse, SearchProvider};

/// HTTP provider for the Tavily search API.
#[derive(Debug, Clone)]
pub struct TavilyProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl TavilyProvider {
    /// Build a provider from the search config.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] when no API key is configured or set
    /// in the environment, or [`SearchError::Http`] if the client cannot be
    /// built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            SearchError::Config(format!(
                "no search API key configured (set search.api_key or {})",
                crate::config::API_KEY_ENV
            ))
        })?;
        Ok(Self {
            client: build_client(config)?,
            endpoint: format!("{}/search", config.base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// The full search endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SearchProvider for TavilyProvider {
    async fn search(&self, request: &ProviderRequest) -> Result<ProviderResponse, SearchError> {
        tracing::trace!(query = %request.query, topic = %request.topic, "tavily request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(SearchError::Provider {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| SearchError::Parse(format!("invalid provider response: {e}")))
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

fn map_transport_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout(e.to_string())
    } else {
        SearchError::Http(e.to_string())
    }
}

/// Pull a readable message out of a provider error body.
///
/// Understands `{"detail": {"error": ".."}}`, `{"detail": ".."}` and
/// `{"error": ".."}`; anything else is returned verbatim (bounded).
fn extract_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.pointer("/detail/error")
            .or_else(|| v.get("detail"))
            .or_else(|| v.get("error"))
            .and_then(|m| m.as_str())
            .map(str::to_owned)
    });
    message.unwrap_or_else(|| body.chars().take(200).collect())
}
