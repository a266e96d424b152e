//! Core types for planned queries, retrieved documents and per-query outcomes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Recency window applied to `general` queries, in days.
pub const DEFAULT_GENERAL_WINDOW_DAYS: u32 = 30;

/// Recency window applied to `news` queries, in days.
pub const DEFAULT_NEWS_WINDOW_DAYS: u32 = 7;

/// Provider-side topic selector for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Broad web index.
    #[default]
    General,
    /// News index, usually combined with a short recency window.
    News,
}

impl Topic {
    /// Returns the wire name used by search providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::News => "news",
        }
    }

    /// Returns the default recency window for this topic.
    pub fn default_window_days(&self) -> u32 {
        match self {
            Self::General => DEFAULT_GENERAL_WINDOW_DAYS,
            Self::News => DEFAULT_NEWS_WINDOW_DAYS,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single planned search query.
///
/// Queries are immutable once built: all fields are private and exposed
/// through accessors. Use the `with_*` builders while planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    text: String,
    topic: Topic,
    recency_window_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain_filter: Option<BTreeSet<String>>,
    /// Provenance tag (the facet that produced this query).
    tag: String,
}

impl SearchQuery {
    /// Create a `general` query with the default 30-day window.
    pub fn new(text: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            topic: Topic::General,
            recency_window_days: Topic::General.default_window_days(),
            domain_filter: None,
            tag: tag.into(),
        }
    }

    /// Set the topic. Does not touch the recency window.
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topic = topic;
        self
    }

    /// Set the recency window in days.
    pub fn with_recency_window_days(mut self, days: u32) -> Self {
        self.recency_window_days = days;
        self
    }

    /// Restrict results to the given domains. An empty iterator clears the filter.
    pub fn with_domain_filter<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = domains
            .into_iter()
            .map(Into::into)
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self.domain_filter = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn recency_window_days(&self) -> u32 {
        self.recency_window_days
    }

    pub fn domain_filter(&self) -> Option<&BTreeSet<String>> {
        self.domain_filter.as_ref()
    }

    /// The provenance tag attached by the planner.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// A document retrieved from the search provider, after normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Source URL. Deduplication key (after URL normalisation).
    pub url: String,
    /// Page title, empty when the provider did not supply one.
    pub title: String,
    /// Readable text content, empty when the provider did not supply any.
    pub content: String,
    /// Provider relevance score, clamped to `[0.0, 1.0]`.
    pub relevance_score: f64,
    /// Tag of the query that produced this document.
    #[serde(default)]
    pub origin: String,
}

impl SourceDocument {
    /// Build a document, clamping the relevance score into `[0.0, 1.0]`.
    ///
    /// Non-finite scores become `0.0`.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        relevance_score: f64,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            relevance_score: clamp_score(relevance_score),
            origin: String::new(),
        }
    }

    /// Attach the provenance tag of the originating query.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Outcome of running one planned query.
///
/// Failures are data, not errors: a failed query carries
/// `succeeded = false`, an [`ErrorKind`] and no documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: SearchQuery,
    pub documents: Vec<SourceDocument>,
    pub succeeded: bool,
    pub error: Option<ErrorKind>,
    /// Number of provider calls made (0 for cache hits and pre-cancelled queries).
    pub attempts: u32,
    /// Last underlying failure message, kept for observability.
    pub detail: Option<String>,
}

impl QueryResult {
    /// A successful outcome carrying the retrieved documents.
    pub fn success(query: SearchQuery, documents: Vec<SourceDocument>, attempts: u32) -> Self {
        Self {
            query,
            documents,
            succeeded: true,
            error: None,
            attempts,
            detail: None,
        }
    }

    /// A failed outcome. Always carries [`ErrorKind::RetrievalFailed`] and no documents.
    pub fn failure(query: SearchQuery, attempts: u32, detail: impl Into<String>) -> Self {
        Self {
            query,
            documents: Vec::new(),
            succeeded: false,
            error: Some(ErrorKind::RetrievalFailed),
            attempts,
            detail: Some(detail.into()),
        }
    }
}
