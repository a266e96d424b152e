//! Build, summarize and persist one token's research, with retry.
//!
//! The unit of retry is the whole run: pipeline, optional summary and the
//! store commit. A failed commit therefore re-runs retrieval on the next
//! attempt rather than re-committing a stale artifact. A run the caller
//! cancels is discarded: it ends with [`ResearchError::Cancelled`] and
//! leaves the store untouched.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use wtt_search::{RetryPolicy, SearchProvider};

use super::pipeline::ResearchPipeline;
use crate::error::{ResearchError, Result};
use crate::llm::{TextGenerator, summary_prompt};
use crate::store::{ArtifactStore, ResearchRecord, StoreError};

/// The token being researched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub id: i64,
    pub name: String,
}

impl TokenRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Outer research workflow with exponential backoff between attempts.
pub struct ResearchWorkflow<P, S> {
    pipeline: ResearchPipeline<P>,
    store: Arc<S>,
    summarizer: Option<Arc<dyn TextGenerator>>,
    retry: RetryPolicy,
}

impl<P: SearchProvider, S: ArtifactStore + 'static> ResearchWorkflow<P, S> {
    pub fn new(pipeline: ResearchPipeline<P>, store: S, retry: RetryPolicy) -> Self {
        Self {
            pipeline,
            store: Arc::new(store),
            summarizer: None,
            retry,
        }
    }

    /// Summarize each artifact with `summarizer` before committing.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn TextGenerator>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn store(&self) -> &S {
        self.store.as_ref()
    }

    /// Run the workflow for `token` until it commits or attempts run out.
    ///
    /// # Errors
    ///
    /// - [`ResearchError::InvalidInput`] immediately for an empty token name.
    /// - [`ResearchError::Cancelled`] when the caller cancels mid-attempt.
    /// - [`ResearchError::WorkflowExhausted`] carrying the last failure once
    ///   every attempt has failed.
    pub async fn run(&self, token: &TokenRef) -> Result<ResearchRecord> {
        self.run_with_cancel(token, &CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), abandoning retries once `cancel` fires.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn run_with_cancel(
        &self,
        token: &TokenRef,
        cancel: &CancellationToken,
    ) -> Result<ResearchRecord> {
        let max_attempts = self.retry.attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let error = match self.attempt(token, cancel).await {
                Ok(record) => return Ok(record),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            tracing::warn!(
                token = %token.name,
                attempt,
                max_attempts,
                error = %error,
                "research attempt failed"
            );

            if attempt >= max_attempts || cancel.is_cancelled() {
                return Err(ResearchError::WorkflowExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.retry.delay_for_retry(attempt);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ResearchError::WorkflowExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt(&self, token: &TokenRef, cancel: &CancellationToken) -> Result<ResearchRecord> {
        let artifact = self
            .pipeline
            .research_with_cancel(&token.name, cancel)
            .await?;
        ensure_live(cancel, "after retrieval")?;

        let summary = match &self.summarizer {
            Some(generator) => {
                let prompt = summary_prompt(artifact.subject(), artifact.budgeted_text());
                let generated = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(ResearchError::Cancelled("during summarization".into()));
                    }
                    generated = generator.generate(&prompt) => generated?,
                };
                Some(generated)
            }
            None => None,
        };
        ensure_live(cancel, "before commit")?;

        let record = ResearchRecord {
            token_id: token.id,
            token_name: token.name.trim().to_owned(),
            artifact,
            summary,
            created_at: Utc::now(),
        };

        let store = Arc::clone(&self.store);
        let (record, row_id) = tokio::task::spawn_blocking(move || {
            let row_id = store.commit(&record)?;
            Ok::<_, StoreError>((record, row_id))
        })
        .await
        .map_err(|e| StoreError::Io(format!("commit task failed: {e}")))??;

        tracing::debug!(row_id, token = %record.token_name, "research attempt committed");
        Ok(record)
    }
}

fn ensure_live(cancel: &CancellationToken, stage: &str) -> Result<()> {
    if cancel.is_cancelled() {
        tracing::info!(stage, "research run cancelled, discarding result");
        return Err(ResearchError::Cancelled(stage.to_owned()));
    }
    Ok(())
}
