//! Research pipeline: plan, retrieve under a deadline, build.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wtt_search::{RetrievalExecutor, SearchProvider, SearchQuery, Topic};

use super::artifact::{ArtifactBuilder, ResearchArtifact};
use super::planner::{NewsClassifier, QueryPlanner};
use crate::config::ResearchConfig;
use crate::error::Result;

/// One research run per [`research`](Self::research) call.
///
/// Holds no state between runs apart from the executor's result cache.
pub struct ResearchPipeline<P> {
    planner: QueryPlanner,
    executor: RetrievalExecutor<P>,
    builder: ArtifactBuilder,
    classifier: Option<Arc<dyn NewsClassifier>>,
    deadline: Duration,
}

impl<P: SearchProvider> ResearchPipeline<P> {
    /// Build a pipeline over `provider` after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Config`](crate::ResearchError::Config) for
    /// invalid configuration.
    pub fn new(provider: P, config: &ResearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            planner: QueryPlanner::new(config.planner.clone()),
            executor: RetrievalExecutor::new(provider, config.search.clone())?,
            builder: ArtifactBuilder::new(config.budget.clone()),
            classifier: None,
            deadline: Duration::from_secs(config.pipeline.timeout_seconds),
        })
    }

    /// Consult `classifier` before planning each run.
    pub fn with_classifier(mut self, classifier: Arc<dyn NewsClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Override the retrieval deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn executor(&self) -> &RetrievalExecutor<P> {
        &self.executor
    }

    /// Research `subject` for today.
    ///
    /// # Errors
    ///
    /// Only [`ResearchError::InvalidInput`](crate::ResearchError::InvalidInput):
    /// retrieval failures are recorded in the artifact.
    pub async fn research(&self, subject: &str) -> Result<ResearchArtifact> {
        self.research_with_cancel(subject, &CancellationToken::new())
            .await
    }

    /// Research `subject`, stopping early when `cancel` fires.
    ///
    /// Cancellation and the deadline behave alike. The deadline covers the
    /// classifier call as well as retrieval: an unanswered classification
    /// falls back to the general topic, and queries still in flight are
    /// reported as failed while the artifact is built from the rest.
    ///
    /// # Errors
    ///
    /// Only [`ResearchError::InvalidInput`](crate::ResearchError::InvalidInput).
    pub async fn research_with_cancel(
        &self,
        subject: &str,
        cancel: &CancellationToken,
    ) -> Result<ResearchArtifact> {
        let (scope, timer) = self.arm_deadline(cancel);
        let planned = match &self.classifier {
            Some(classifier) => {
                self.planner
                    .plan_classified(subject, classifier.as_ref(), &scope)
                    .await
            }
            None => self.planner.plan(subject),
        };
        let artifact = match planned {
            Ok(queries) => Ok(self.run(subject, &queries, &scope).await),
            Err(e) => Err(e),
        };
        timer.abort();
        artifact
    }

    /// Research `subject` with a fixed date and news classification.
    ///
    /// # Errors
    ///
    /// Only [`ResearchError::InvalidInput`](crate::ResearchError::InvalidInput).
    pub async fn research_on(
        &self,
        subject: &str,
        date: NaiveDate,
        news_topic: Topic,
    ) -> Result<ResearchArtifact> {
        let queries = self.planner.plan_on(subject, date, news_topic)?;
        let (scope, timer) = self.arm_deadline(&CancellationToken::new());
        let artifact = self.run(subject, &queries, &scope).await;
        timer.abort();
        Ok(artifact)
    }

    /// Child of `cancel` that also fires once the deadline passes.
    fn arm_deadline(&self, cancel: &CancellationToken) -> (CancellationToken, JoinHandle<()>) {
        let scope = cancel.child_token();
        let timer = {
            let scope = scope.clone();
            let deadline = self.deadline;
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!(?deadline, "research deadline passed, cancelling run");
                scope.cancel();
            })
        };
        (scope, timer)
    }

    async fn run(
        &self,
        subject: &str,
        queries: &[SearchQuery],
        scope: &CancellationToken,
    ) -> ResearchArtifact {
        let results = self.executor.execute_with_cancel(queries, scope).await;
        self.builder.build(subject, queries, &results)
    }
}
