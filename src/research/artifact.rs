//! Research artifact assembly.
//!
//! [`ArtifactBuilder::build`] is pure: it aggregates already-fetched
//! results, fits each document into a per-document budget, joins them with
//! source headers and fits the combined text into the overall budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wtt_search::{QueryResult, SearchQuery, SourceDocument};

use super::aggregate::aggregate;
use super::budget::{BudgetOutcome, count_tokens, fit, truncate};
use crate::config::BudgetConfig;

/// How the planned queries fared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    pub planned: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// The bounded research output for one subject.
///
/// Immutable once built. Every document has a distinct URL and
/// `budgeted_text` measures within the configured budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchArtifact {
    id: Uuid,
    subject: String,
    generated_at: DateTime<Utc>,
    queries: Vec<SearchQuery>,
    documents: Vec<SourceDocument>,
    total_source_count: usize,
    duplicates_discarded: usize,
    query_stats: QueryStats,
    budgeted_text: String,
    token_count: usize,
    budget_outcome: BudgetOutcome,
}

impl ResearchArtifact {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// The planned queries, in planning order.
    pub fn queries(&self) -> &[SearchQuery] {
        &self.queries
    }

    /// Deduplicated documents in first-seen order, content fitted to the
    /// per-document budget.
    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn total_source_count(&self) -> usize {
        self.total_source_count
    }

    pub fn duplicates_discarded(&self) -> usize {
        self.duplicates_discarded
    }

    pub fn query_stats(&self) -> QueryStats {
        self.query_stats
    }

    /// Combined, attributed text for summarization.
    pub fn budgeted_text(&self) -> &str {
        &self.budgeted_text
    }

    /// Token estimate of [`budgeted_text`](Self::budgeted_text).
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn budget_outcome(&self) -> BudgetOutcome {
        self.budget_outcome
    }

    /// True when no sources survived retrieval.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Assembles [`ResearchArtifact`]s under a token budget.
#[derive(Debug, Clone, Default)]
pub struct ArtifactBuilder {
    budget: BudgetConfig,
}

impl ArtifactBuilder {
    pub fn new(budget: BudgetConfig) -> Self {
        Self { budget }
    }

    /// Per-document budget for `document_count` documents.
    ///
    /// The configured value wins; otherwise the overall budget is split
    /// evenly. Never below 1.
    pub fn per_document_budget(&self, document_count: usize) -> usize {
        self.budget
            .per_document_tokens
            .unwrap_or_else(|| self.budget.max_tokens / document_count.max(1))
            .max(1)
    }

    /// Build the artifact for `subject` from executed `queries`.
    pub fn build(
        &self,
        subject: &str,
        queries: &[SearchQuery],
        results: &[QueryResult],
    ) -> ResearchArtifact {
        let merged = aggregate(results);
        let per_doc = self.per_document_budget(merged.documents.len());

        let documents: Vec<SourceDocument> = merged
            .documents
            .into_iter()
            .map(|mut doc| {
                doc.content = truncate(&doc.content, per_doc);
                doc
            })
            .collect();

        let combined = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| attributed_section(i + 1, doc))
            .collect::<Vec<_>>()
            .join("\n\n");
        let fitted = fit(&combined, self.budget.max_tokens);
        let token_count = count_tokens(&fitted.text);

        tracing::info!(
            subject,
            sources = documents.len(),
            duplicates = merged.summary.duplicates_discarded,
            failed_queries = merged.summary.failed_queries,
            tokens = token_count,
            outcome = ?fitted.outcome,
            "research artifact built"
        );

        ResearchArtifact {
            id: Uuid::new_v4(),
            subject: subject.trim().to_owned(),
            generated_at: Utc::now(),
            queries: queries.to_vec(),
            total_source_count: documents.len(),
            documents,
            duplicates_discarded: merged.summary.duplicates_discarded,
            query_stats: QueryStats {
                planned: queries.len(),
                succeeded: merged.summary.succeeded_queries,
                failed: merged.summary.failed_queries,
            },
            budgeted_text: fitted.text,
            token_count,
            budget_outcome: fitted.outcome,
        }
    }
}

/// `Source N: <title> <url>.` followed by the document content.
fn attributed_section(index: usize, doc: &SourceDocument) -> String {
    let label = [doc.title.trim(), doc.url.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let header = format!("Source {index}: {label}.");
    if doc.content.is_empty() {
        header
    } else {
        format!("{header}\n{}", doc.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str, title: &str, content: &str) -> SourceDocument {
        SourceDocument::new(url, title, content, 0.5)
    }

    fn ok(tag: &str, docs: Vec<SourceDocument>) -> QueryResult {
        QueryResult::success(SearchQuery::new(tag, tag), docs, 1)
    }

    fn builder(max_tokens: usize, per_document_tokens: Option<usize>) -> ArtifactBuilder {
        ArtifactBuilder::new(BudgetConfig {
            max_tokens,
            per_document_tokens,
        })
    }

    #[test]
    fn builds_attributed_text_in_order() {
        let queries = vec![SearchQuery::new("q1", "technical"), SearchQuery::new("q2", "news")];
        let results = vec![
            ok("technical", vec![doc("https://a.example", "Alpha", "Alpha is a chain.")]),
            ok("news", vec![doc("https://b.example", "Beta", "Beta launched.")]),
        ];

        let artifact = builder(1_000, None).build("ExampleCoin", &queries, &results);

        assert_eq!(artifact.subject(), "ExampleCoin");
        assert_eq!(artifact.total_source_count(), 2);
        assert_eq!(artifact.query_stats().planned, 2);
        assert_eq!(artifact.budget_outcome(), BudgetOutcome::WithinBudget);
        assert_eq!(
            artifact.budgeted_text(),
            "Source 1: Alpha https://a.example.\nAlpha is a chain.\n\n\
             Source 2: Beta https://b.example.\nBeta launched."
        );
        assert_eq!(artifact.token_count(), count_tokens(artifact.budgeted_text()));
    }

    #[test]
    fn budgeted_text_never_exceeds_budget() {
        let long = "Sentence number one here. ".repeat(40);
        let results: Vec<QueryResult> = (0..5)
            .map(|i| ok("q", vec![doc(&format!("https://{i}.example"), "T", &long)]))
            .collect();

        for max_tokens in [1, 10, 50, 200, 1_000] {
            let artifact = builder(max_tokens, None).build("ExampleCoin", &[], &results);
            assert!(
                count_tokens(artifact.budgeted_text()) <= max_tokens,
                "over budget at {max_tokens}"
            );
        }
    }

    #[test]
    fn per_document_budget_split_and_floor() {
        let b = builder(100, None);
        assert_eq!(b.per_document_budget(0), 100);
        assert_eq!(b.per_document_budget(4), 25);
        assert_eq!(b.per_document_budget(1_000), 1);
        assert_eq!(builder(100, Some(7)).per_document_budget(2), 7);
    }

    #[test]
    fn documents_truncated_individually() {
        // Each sentence costs 4 tokens; per-document budget 5 keeps one.
        let results = vec![ok(
            "q",
            vec![doc("https://a.example", "A", "One two. Three four. Five six.")],
        )];
        let artifact = builder(1_000, Some(5)).build("ExampleCoin", &[], &results);
        assert_eq!(artifact.documents()[0].content, "One two.");
    }

    #[test]
    fn empty_results_give_empty_artifact() {
        let queries = vec![SearchQuery::new("q", "technical")];
        let failed = QueryResult::failure(queries[0].clone(), 3, "down");
        let artifact = builder(100, None).build("ExampleCoin", &queries, &[failed]);

        assert!(artifact.is_empty());
        assert_eq!(artifact.total_source_count(), 0);
        assert_eq!(artifact.budgeted_text(), "");
        assert_eq!(artifact.token_count(), 0);
        assert_eq!(artifact.budget_outcome(), BudgetOutcome::WithinBudget);
        assert_eq!(
            artifact.query_stats(),
            QueryStats {
                planned: 1,
                succeeded: 0,
                failed: 1
            }
        );
    }

    #[test]
    fn header_skips_missing_title() {
        let section = attributed_section(3, &doc("https://a.example", "", ""));
        assert_eq!(section, "Source 3: https://a.example.");
    }

    #[test]
    fn artifact_serializes_round_trip() {
        let results = vec![ok("q", vec![doc("https://a.example", "A", "Text.")])];
        let artifact = builder(100, None).build("ExampleCoin", &[], &results);
        let json = serde_json::to_string(&artifact).expect("serialize");
        let back: ResearchArtifact = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, artifact);
    }
}
