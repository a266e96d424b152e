//! Cross-query merge and deduplication.
//!
//! Results are walked in planning order and the first document seen for a
//! URL wins. Order is first-seen order, never re-sorted by score, so
//! earlier (higher-priority) facets keep their documents.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use wtt_search::url_normalize::normalize_url;
use wtt_search::{QueryResult, SourceDocument};

/// Counters describing one aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Documents kept after deduplication.
    pub total_source_count: usize,
    /// Documents dropped because an earlier result had the same URL.
    pub duplicates_discarded: usize,
    pub succeeded_queries: usize,
    pub failed_queries: usize,
}

/// Deduplicated documents plus counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub documents: Vec<SourceDocument>,
    pub summary: AggregateSummary,
}

/// Merge per-query results into one deduplicated, ordered collection.
///
/// Failed queries contribute no documents. No successful queries yields an
/// empty aggregate, not an error.
pub fn aggregate(results: &[QueryResult]) -> Aggregate {
    let mut seen: HashSet<String> = HashSet::new();
    let mut documents = Vec::new();
    let mut summary = AggregateSummary::default();

    for result in results {
        if !result.succeeded {
            summary.failed_queries += 1;
            continue;
        }
        summary.succeeded_queries += 1;

        for doc in &result.documents {
            if seen.insert(normalize_url(&doc.url)) {
                documents.push(doc.clone());
            } else {
                tracing::trace!(url = %doc.url, origin = %doc.origin, "duplicate source discarded");
                summary.duplicates_discarded += 1;
            }
        }
    }

    summary.total_source_count = documents.len();
    Aggregate { documents, summary }
}
