//! Database schema for the variable store.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema.
///
/// Timestamps are INTEGER Unix milliseconds. Variable values are the JSON
/// form of `StoreValue`; NULL means no value has been written yet.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- Collections: named groups of variables
CREATE TABLE IF NOT EXISTS collections (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

-- Variables: typed entries addressed by slash-delimited name
CREATE TABLE IF NOT EXISTS variables (
    id TEXT PRIMARY KEY,
    collection_id TEXT NOT NULL,
    name TEXT NOT NULL,
    resolved_type TEXT NOT NULL CHECK (resolved_type IN ('color', 'number', 'string', 'boolean')),
    value TEXT,
    description TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (collection_id, name),
    FOREIGN KEY (collection_id) REFERENCES collections(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_variables_collection ON variables(collection_id);

-- Events: audit log of every mutation
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at DESC);
";

/// Apply the schema to a connection.
///
/// Safe to call on an existing database.
///
/// # Errors
///
/// Returns an error if a pragma or statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_applies_twice() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");

        let versions: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn test_type_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO collections (id, name, created_at) VALUES ('c1', 'Tokens', 0)",
            [],
        )
        .unwrap();

        let ok = conn.execute(
            "INSERT INTO variables (id, collection_id, name, resolved_type, created_at, updated_at)
             VALUES ('v1', 'c1', 'Color/Primary', 'color', 0, 0)",
            [],
        );
        assert!(ok.is_ok());

        let bad = conn.execute(
            "INSERT INTO variables (id, collection_id, name, resolved_type, created_at, updated_at)
             VALUES ('v2', 'c1', 'Spacing/M', 'dimension', 0, 0)",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_name_unique_per_collection() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO collections (id, name, created_at) VALUES ('c1', 'A', 0), ('c2', 'B', 0);
             INSERT INTO variables (id, collection_id, name, resolved_type, created_at, updated_at)
             VALUES ('v1', 'c1', 'X', 'string', 0, 0);",
        )
        .unwrap();

        let other_collection = conn.execute(
            "INSERT INTO variables (id, collection_id, name, resolved_type, created_at, updated_at)
             VALUES ('v2', 'c2', 'X', 'string', 0, 0)",
            [],
        );
        assert!(other_collection.is_ok());

        let same_collection = conn.execute(
            "INSERT INTO variables (id, collection_id, name, resolved_type, created_at, updated_at)
             VALUES ('v3', 'c1', 'X', 'string', 0, 0)",
            [],
        );
        assert!(same_collection.is_err());
    }
}
