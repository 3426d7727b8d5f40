//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::IndexError;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<(), IndexError> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get current version
    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<(), IndexError> {
    match version {
        1 => apply_v1(conn),
        _ => Err(IndexError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), IndexError> {
    conn.execute_batch(
        r#"
        -- Entries table: one row per sealed chain entry
        CREATE TABLE entries (
            sequence INTEGER PRIMARY KEY,     -- chain position, starts at 1
            partition TEXT NOT NULL,          -- UTC day of the entry timestamp, YYYY.MM.DD
            message_id TEXT NOT NULL,
            channel_id TEXT NOT NULL,
            message_type TEXT NOT NULL,
            timestamp_us INTEGER NOT NULL,    -- event time, microseconds since epoch
            payload TEXT NOT NULL,            -- payload as JSON text
            payload_hash BLOB NOT NULL,       -- 32 bytes, SHA-256 of canonical payload
            prev_hash BLOB NOT NULL,          -- 32 bytes
            chain_hash BLOB NOT NULL,         -- 32 bytes
            validation BLOB NOT NULL,         -- CBOR-encoded validation summary
            ingested_at INTEGER NOT NULL,     -- local timestamp of ingestion (Unix ms)

            UNIQUE(partition, message_id)
        );

        -- Indexes for common queries
        CREATE INDEX idx_entries_message_id ON entries(message_id);
        CREATE INDEX idx_entries_timestamp ON entries(timestamp_us);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
