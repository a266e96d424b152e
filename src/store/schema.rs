//! SQLite DDL for the research artifact store.

use rusqlite::Connection;

/// Current schema version stamped into `schema_meta`.
pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Complete DDL for the research database.
///
/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- One row per committed research run.
CREATE TABLE IF NOT EXISTS token_extracted_data (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    token_id         INTEGER NOT NULL,
    token_name       TEXT NOT NULL,
    research_results TEXT NOT NULL,      -- ResearchArtifact as JSON
    summary          TEXT,
    created_at       TEXT NOT NULL       -- RFC 3339, UTC
);

CREATE INDEX IF NOT EXISTS idx_extracted_token_name ON token_extracted_data(token_name);
CREATE INDEX IF NOT EXISTS idx_extracted_token_id   ON token_extracted_data(token_id);
"#;

/// Apply the full schema to an open connection and seed the version.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Read the schema version, `None` for an unstamped database.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    use rusqlite::OptionalExtension;

    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_twice() {
        let conn = Connection::open_in_memory().expect("open");
        apply_schema(&conn).expect("first");
        apply_schema(&conn).expect("second");
        assert_eq!(read_schema_version(&conn).expect("version"), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn unstamped_database_has_no_version() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("CREATE TABLE schema_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);")
            .expect("create");
        assert_eq!(read_schema_version(&conn).expect("version"), None);
    }
}
