//! Research artifact persistence.
//!
//! [`ArtifactStore`] is commit-or-fail: a commit either stores the whole
//! record and returns its row id, or returns an error and stores nothing.

mod schema;
pub mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::research::artifact::ResearchArtifact;

pub use sqlite::SqliteArtifactStore;

/// A committed (or to-be-committed) research run for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub token_id: i64,
    pub token_name: String,
    pub artifact: ResearchArtifact,
    /// Model summary of the artifact, when a summarizer is configured.
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Persistence collaborator for research records.
pub trait ArtifactStore: Send + Sync {
    /// Store `record`, returning its row id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if nothing was stored.
    fn commit(&self, record: &ResearchRecord) -> Result<i64, StoreError>;

    /// Most recent record for `token_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup itself fails.
    fn latest(&self, token_name: &str) -> Result<Option<ResearchRecord>, StoreError>;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    fn commit(&self, record: &ResearchRecord) -> Result<i64, StoreError> {
        (**self).commit(record)
    }

    fn latest(&self, token_name: &str) -> Result<Option<ResearchRecord>, StoreError> {
        (**self).latest(token_name)
    }
}

/// Errors from the artifact store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("lock poisoned: {0}")]
    Lock(String),
}
