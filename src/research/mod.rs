//! The research aggregation pipeline.

pub mod aggregate;
pub mod artifact;
pub mod budget;
pub mod pipeline;
pub mod planner;
pub mod workflow;

pub use aggregate::{Aggregate, AggregateSummary, aggregate};
pub use artifact::{ArtifactBuilder, QueryStats, ResearchArtifact};
pub use budget::{BudgetOutcome, Fitted, count_tokens, fit, truncate};
pub use planner::{Facet, FixedClassifier, NewsClassifier, QueryPlanner};
