//! Query planning: one search query per research facet.
//!
//! Planning is pure string composition over the subject and a date. The
//! only external input is an optional newsworthiness classification, which
//! decides whether the news facet queries the provider's news index.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use wtt_search::{ErrorKind, SearchQuery, Topic};

use crate::config::PlannerConfig;
use crate::error::{ResearchError, Result};

/// A research facet. Each facet yields exactly one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// Technology and blockchain details.
    Technical,
    /// Official documentation and whitepapers.
    Documentation,
    /// Current market and price status.
    Market,
    /// Recent news.
    News,
}

impl Facet {
    /// Every facet in default priority order.
    pub const ALL: [Facet; 4] = [
        Facet::Technical,
        Facet::Documentation,
        Facet::Market,
        Facet::News,
    ];

    /// Provenance tag attached to the facet's query and its documents.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Documentation => "documentation",
            Self::Market => "market",
            Self::News => "news",
        }
    }

    /// Parse a provenance tag back into a facet.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }

    fn compose(self, subject: &str, date: NaiveDate) -> String {
        match self {
            Self::Technical => {
                format!("{subject} cryptocurrency token technology blockchain details")
            }
            Self::Documentation => format!("{subject} official documentation whitepaper"),
            Self::Market => format!(
                "{subject} token price market status {}",
                date.format("%B %Y")
            ),
            Self::News => format!("{subject} latest news {}", date.format("%Y-%m-%d")),
        }
    }
}

/// Decides whether a subject is currently newsworthy.
///
/// Returning [`Topic::News`] routes the news facet to the provider's news
/// index with the short recency window.
#[async_trait]
pub trait NewsClassifier: Send + Sync {
    /// Classify `subject`.
    ///
    /// # Errors
    ///
    /// Any error is treated as "classification unavailable" by the planner,
    /// which then falls back to [`Topic::General`].
    async fn classify(&self, subject: &str) -> Result<Topic>;
}

/// Classifier with a fixed answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClassifier(pub bool);

#[async_trait]
impl NewsClassifier for FixedClassifier {
    async fn classify(&self, _subject: &str) -> Result<Topic> {
        Ok(if self.0 { Topic::News } else { Topic::General })
    }
}

/// Builds the ordered query set for a subject.
#[derive(Debug, Clone, Default)]
pub struct QueryPlanner {
    config: PlannerConfig,
}

impl QueryPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan for today (UTC) with the news facet on the general index.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::InvalidInput`] for an empty subject.
    pub fn plan(&self, subject: &str) -> Result<Vec<SearchQuery>> {
        self.plan_on(subject, Utc::now().date_naive(), Topic::General)
    }

    /// Plan for a fixed `date` with a known news classification.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::InvalidInput`] for an empty subject.
    pub fn plan_on(
        &self,
        subject: &str,
        date: NaiveDate,
        news_topic: Topic,
    ) -> Result<Vec<SearchQuery>> {
        let subject = validate_subject(subject)?;

        let queries: Vec<SearchQuery> = self
            .config
            .facets
            .iter()
            .map(|&facet| self.query_for(facet, subject, date, news_topic))
            .collect();

        tracing::debug!(
            subject,
            count = queries.len(),
            news_topic = %news_topic,
            "planned research queries"
        );
        Ok(queries)
    }

    /// Classify the subject first, then plan for today.
    ///
    /// A classifier failure never fails planning: it is logged as
    /// `CLASSIFICATION_UNAVAILABLE` and the news facet stays general. The
    /// same applies when `cancel` fires before the classifier answers.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::InvalidInput`] for an empty subject, before
    /// the classifier is consulted.
    pub async fn plan_classified(
        &self,
        subject: &str,
        classifier: &dyn NewsClassifier,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchQuery>> {
        let trimmed = validate_subject(subject)?;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResearchError::Llm(
                "classification abandoned: cancelled".into(),
            )),
            answer = classifier.classify(trimmed) => answer,
        };
        let topic = match outcome {
            Ok(topic) => topic,
            Err(e) => {
                tracing::warn!(
                    code = ErrorKind::ClassificationUnavailable.code(),
                    error = %e,
                    "news classification unavailable, using general topic"
                );
                Topic::General
            }
        };
        self.plan_on(trimmed, Utc::now().date_naive(), topic)
    }

    fn query_for(
        &self,
        facet: Facet,
        subject: &str,
        date: NaiveDate,
        news_topic: Topic,
    ) -> SearchQuery {
        let topic = if facet == Facet::News {
            news_topic
        } else {
            Topic::General
        };
        let window = match topic {
            Topic::News => self.config.news_window_days,
            Topic::General => self.config.general_window_days,
        };

        let query = SearchQuery::new(facet.compose(subject, date), facet.tag())
            .with_topic(topic)
            .with_recency_window_days(window);

        match self.config.domain_filters.get(facet.tag()) {
            Some(domains) => query.with_domain_filter(domains.iter().map(String::as_str)),
            None => query,
        }
    }
}

fn validate_subject(subject: &str) -> Result<&str> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        return Err(ResearchError::InvalidInput(
            "subject must not be empty".into(),
        ));
    }
    Ok(trimmed)
}
