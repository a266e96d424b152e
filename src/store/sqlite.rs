//! SQLite-backed artifact store.
//!
//! Records live in the `token_extracted_data` table; the artifact is kept
//! as a JSON document in `research_results`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::schema::{apply_schema, read_schema_version};
use super::{ArtifactStore, ResearchRecord, StoreError};

/// SQLite artifact store.
///
/// Thread-safe via an internal `Mutex<Connection>`; all access is
/// serialized.
pub struct SqliteArtifactStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteArtifactStore {
    /// Open (or create) the database at `path`, applying the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory cannot be created or
    /// the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        let schema_version = read_schema_version(&conn)?;
        tracing::debug!(path = %path.display(), ?schema_version, "artifact store opened");
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records for `token_name`, newest first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails or a row cannot be decoded.
    pub fn history(&self, token_name: &str, limit: usize) -> Result<Vec<ResearchRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT token_id, token_name, research_results, summary, created_at
             FROM token_extracted_data
             WHERE token_name = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![token_name, limit], RawRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

impl ArtifactStore for SqliteArtifactStore {
    fn commit(&self, record: &ResearchRecord) -> Result<i64, StoreError> {
        let research_results = serde_json::to_string(&record.artifact)
            .map_err(|e| StoreError::Serde(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO token_extracted_data
                (token_id, token_name, research_results, summary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.token_id,
                record.token_name,
                research_results,
                record.summary,
                record.created_at.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(
            id,
            token_id = record.token_id,
            token_name = %record.token_name,
            sources = record.artifact.total_source_count(),
            "research record committed"
        );
        Ok(id)
    }

    fn latest(&self, token_name: &str) -> Result<Option<ResearchRecord>, StoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT token_id, token_name, research_results, summary, created_at
                 FROM token_extracted_data
                 WHERE token_name = ?1
                 ORDER BY id DESC
                 LIMIT 1",
                params![token_name],
                RawRow::from_row,
            )
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }
}

/// Row columns before JSON and timestamp decoding.
struct RawRow {
    token_id: i64,
    token_name: String,
    research_results: String,
    summary: Option<String>,
    created_at: String,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            token_id: row.get(0)?,
            token_name: row.get(1)?,
            research_results: row.get(2)?,
            summary: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<ResearchRecord, StoreError> {
        let artifact = serde_json::from_str(&self.research_results)
            .map_err(|e| StoreError::Serde(format!("research_results: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Serde(format!("created_at: {e}")))?
            .with_timezone(&Utc);
        Ok(ResearchRecord {
            token_id: self.token_id,
            token_name: self.token_name,
            artifact,
            summary: self.summary,
            created_at,
        })
    }
}
