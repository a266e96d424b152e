//! Error types for the research pipeline.

use wtt_search::{ErrorKind, SearchError};

use crate::store::StoreError;

/// Top-level error type for research runs.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    /// The caller supplied an unusable subject or token.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Search provider or executor setup error.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Artifact persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Text generation (classification or summarization) error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The caller cancelled the run; nothing was committed.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The build-and-persist workflow gave up.
    #[error("research workflow failed after {attempts} attempt(s): {last}")]
    WorkflowExhausted {
        attempts: u32,
        last: Box<ResearchError>,
    },
}

impl ResearchError {
    /// The stable error kind for this failure, when one applies.
    ///
    /// Only input validation has a pipeline-level kind; other failures are
    /// collaborator errors around the pipeline.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::InvalidInput(_) => Some(ErrorKind::InvalidInput),
            Self::WorkflowExhausted { last, .. } => last.kind(),
            _ => None,
        }
    }

    /// Returns true when repeating the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidInput(_)
                | Self::Config(_)
                | Self::Cancelled(_)
                | Self::WorkflowExhausted { .. }
        )
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ResearchError>;
