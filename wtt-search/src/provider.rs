//! Search provider seam.
//!
//! A [`SearchProvider`] turns one [`ProviderRequest`] into one
//! [`ProviderResponse`]. Providers are stateless capabilities handed to the
//! [`RetrievalExecutor`](crate::executor::RetrievalExecutor) at construction;
//! retries, timeouts and mapping into [`SourceDocument`]s happen outside them.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::content::{extract_title, normalize_content};
use crate::error::SearchError;
use crate::types::{SearchQuery, SourceDocument, Topic};

/// Parameters sent to the provider for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub query: String,
    pub topic: Topic,
    /// Recency window in days.
    pub days: u32,
    pub max_results: usize,
    pub include_raw_content: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,
}

impl ProviderRequest {
    /// Derive provider parameters from a planned query and the search config.
    pub fn from_query(query: &SearchQuery, config: &SearchConfig) -> Self {
        Self {
            query: query.text().to_owned(),
            topic: query.topic(),
            days: query.recency_window_days(),
            max_results: config.max_results,
            include_raw_content: config.include_raw_content,
            include_domains: query
                .domain_filter()
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

/// Provider response body. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub results: Vec<ProviderHit>,
}

/// One provider-native result object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderHit {
    pub url: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub score: Option<f64>,
    pub raw_content: Option<String>,
}

impl ProviderHit {
    /// Map into a [`SourceDocument`].
    ///
    /// Missing title/content default to empty and a missing score to `0.0`.
    /// When `prefer_raw` is set and raw content is present it replaces the
    /// snippet. Hits without a URL are dropped.
    pub fn into_document(self, prefer_raw: bool, max_chars: usize) -> Option<SourceDocument> {
        let url = self.url.map(|u| u.trim().to_owned()).filter(|u| !u.is_empty())?;

        let raw = self
            .raw_content
            .filter(|r| prefer_raw && !r.trim().is_empty());

        let mut title = self.title.unwrap_or_default().trim().to_owned();
        if title.is_empty() {
            if let Some(ref raw) = raw {
                title = extract_title(raw);
            }
        }

        let body = raw.or(self.content).unwrap_or_default();
        let content = normalize_content(&body, max_chars);

        Some(SourceDocument::new(
            url,
            title,
            content,
            self.score.unwrap_or(0.0),
        ))
    }
}

impl ProviderResponse {
    /// Map every hit into a document tagged with the query's provenance.
    pub fn into_documents(self, query: &SearchQuery, config: &SearchConfig) -> Vec<SourceDocument> {
        self.results
            .into_iter()
            .filter_map(|hit| hit.into_document(config.include_raw_content, config.max_content_chars))
            .map(|doc| doc.with_origin(query.tag()))
            .collect()
    }
}

/// A pluggable web-search backend.
///
/// Implementations perform exactly one call per invocation and report
/// failures as [`SearchError`]; they must not retry internally.
/// All implementations must be `Send + Sync` for concurrent query execution.
pub trait SearchProvider: Send + Sync {
    /// Run one search request.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the call fails at the transport level,
    /// the provider answers with an error status, or the body cannot be
    /// decoded.
    fn search(
        &self,
        request: &ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, SearchError>> + Send;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

impl<P: SearchProvider> SearchProvider for Arc<P> {
    fn search(
        &self,
        request: &ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, SearchError>> + Send {
        (**self).search(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider {
        response: ProviderResponse,
    }

    impl SearchProvider for MockProvider {
        async fn search(&self, _request: &ProviderRequest) -> Result<ProviderResponse, SearchError> {
            if self.response.results.is_empty() {
                return Err(SearchError::Provider {
                    status: 503,
                    message: "mock provider failure".into(),
                });
            }
            Ok(self.response.clone())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn hit(url: &str) -> ProviderHit {
        ProviderHit {
            url: Some(url.into()),
            title: Some("Title".into()),
            content: Some("Snippet text.".into()),
            score: Some(0.8),
            raw_content: None,
        }
    }

    #[test]
    fn mock_provider_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockProvider>();
        assert_send_sync::<Arc<MockProvider>>();
    }

    #[tokio::test]
    async fn arc_provider_delegates() {
        let provider = Arc::new(MockProvider {
            response: ProviderResponse {
                results: vec![hit("https://a.example")],
            },
        });
        let request = ProviderRequest::from_query(&SearchQuery::new("q", "t"), &SearchConfig::default());
        let response = provider.search(&request).await.expect("should succeed");
        assert_eq!(response.results.len(), 1);
        assert_eq!(SearchProvider::name(&provider), "mock");
    }

    #[test]
    fn request_derived_from_query() {
        let query = SearchQuery::new("ExampleCoin latest news", "news")
            .with_topic(Topic::News)
            .with_recency_window_days(7)
            .with_domain_filter(["coindesk.com"]);
        let config = SearchConfig {
            max_results: 4,
            include_raw_content: false,
            ..Default::default()
        };
        let request = ProviderRequest::from_query(&query, &config);
        assert_eq!(request.query, "ExampleCoin latest news");
        assert_eq!(request.topic, Topic::News);
        assert_eq!(request.days, 7);
        assert_eq!(request.max_results, 4);
        assert!(!request.include_raw_content);
        assert_eq!(request.include_domains, vec!["coindesk.com".to_owned()]);
    }

    #[test]
    fn request_omits_empty_domains_on_wire() {
        let request = ProviderRequest::from_query(&SearchQuery::new("q", "t"), &SearchConfig::default());
        let json = serde_json::to_value(&request).expect("serialize");
        assert!(json.get("include_domains").is_none());
        assert_eq!(json["topic"], "general");
        assert_eq!(json["days"], 30);
    }

    #[test]
    fn missing_fields_default() {
        let response: ProviderResponse =
            serde_json::from_str(r#"{"results": [{"url": "https://a.example"}]}"#).expect("parse");
        let docs = response.into_documents(&SearchQuery::new("q", "market"), &SearchConfig::default());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "");
        assert_eq!(docs[0].content, "");
        assert!(docs[0].relevance_score.abs() < f64::EPSILON);
        assert_eq!(docs[0].origin, "market");
    }

    #[test]
    fn missing_results_key_is_empty() {
        let response: ProviderResponse = serde_json::from_str("{}").expect("parse");
        assert!(response.results.is_empty());
    }

    #[test]
    fn hits_without_url_dropped() {
        let response = ProviderResponse {
            results: vec![
                ProviderHit {
                    url: None,
                    ..hit("")
                },
                ProviderHit {
                    url: Some("   ".into()),
                    ..hit("")
                },
                hit("https://kept.example"),
            ],
        };
        let docs = response.into_documents(&SearchQuery::new("q", "t"), &SearchConfig::default());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url, "https://kept.example");
    }

    #[test]
    fn raw_content_preferred_when_requested() {
        let with_raw = ProviderHit {
            raw_content: Some("<html><head><title>Raw</title></head><body><p>Full page.</p></body></html>".into()),
            title: None,
            ..hit("https://a.example")
        };
        let doc = with_raw.clone().into_document(true, 1000).expect("doc");
        assert_eq!(doc.content, "Full page.");
        assert_eq!(doc.title, "Raw");

        let doc = with_raw.into_document(false, 1000).expect("doc");
        assert_eq!(doc.content, "Snippet text.");
        assert_eq!(doc.title, "");
    }

    #[test]
    fn blank_raw_content_falls_back_to_snippet() {
        let h = ProviderHit {
            raw_content: Some("  ".into()),
            ..hit("https://a.example")
        };
        let doc = h.into_document(true, 1000).expect("doc");
        assert_eq!(doc.content, "Snippet text.");
    }
}
