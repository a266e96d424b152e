//! WTT: token research aggregation.
//!
//! Researches a named token by querying a web-search provider across
//! several facets and condensing the results into one bounded artifact for
//! downstream summarization:
//! Subject → Planner → Executor → Aggregator → Budgeter → Artifact
//!
//! # Architecture
//!
//! - **Planner**: one query per facet (technical, documentation, market, news)
//! - **Executor**: concurrent retrieval with per-query retry (`wtt-search`)
//! - **Aggregator**: first-seen deduplication by normalised URL
//! - **Budgeter**: sentence-boundary truncation to a token budget
//! - **Workflow**: build, summarize and persist with its own retry loop

pub mod config;
pub mod error;
pub mod llm;
pub mod research;
pub mod store;
pub mod wtt_dirs;

pub use config::ResearchConfig;
pub use error::{ResearchError, Result};
pub use research::artifact::ResearchArtifact;
pub use research::pipeline::ResearchPipeline;
pub use research::workflow::{ResearchWorkflow, TokenRef};
pub use store::{ArtifactStore, ResearchRecord, SqliteArtifactStore};
