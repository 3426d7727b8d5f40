//! SQLite implementation of the authoritative index.
//!
//! rusqlite is synchronous, so every operation acquires the connection
//! mutex inside `spawn_blocking` to stay off the async runtime threads.
//! The mutex also serializes the duplicate probe and the insert, so a
//! storage key can never be claimed twice within one process; the unique
//! constraint backstops writers from other processes.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chainseal_core::{ChainHash, HashEntry, PayloadHash, ValidationSummary};
use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::IndexError;
use crate::key::StorageKey;
use crate::migration::{self, now_millis};
use crate::traits::{IndexOutcome, IndexStore};

/// SQLite-backed index.
#[derive(Clone)]
pub struct SqliteIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteIndex {
    /// Open (or create) an index database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let mut conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        migration::migrate(&mut conn)?;
        debug!(path = %path.as_ref().display(), "opened index database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory index (for tests).
    pub fn open_memory() -> Result<Self, IndexError> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl IndexStore for SqliteIndex {
    async fn store(&self, entry: &HashEntry) -> Result<IndexOutcome, IndexError> {
        let conn = Arc::clone(&self.conn);
        let entry = entry.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            let key = StorageKey::for_entry(&entry);

            let existing: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT chain_hash FROM entries WHERE partition = ?1 AND message_id = ?2",
                    params![key.partition, entry.message_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(bytes) = existing {
                let existing = decode_chain_hash(&bytes)?;
                if existing == entry.chain_hash {
                    return Ok(IndexOutcome::AlreadyStored);
                }
                return Ok(IndexOutcome::Conflict { existing });
            }

            let payload = serde_json::to_string(&entry.payload)
                .map_err(|e| IndexError::Encode(e.to_string()))?;
            let mut validation = Vec::new();
            ciborium::into_writer(&entry.validation, &mut validation)
                .map_err(|e| IndexError::Encode(e.to_string()))?;

            conn.execute(
                "INSERT INTO entries (sequence, partition, message_id, channel_id, \
                 message_type, timestamp_us, payload, payload_hash, prev_hash, \
                 chain_hash, validation, ingested_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    entry.sequence as i64,
                    key.partition,
                    entry.message_id,
                    entry.channel_id,
                    entry.message_type,
                    entry.timestamp.timestamp_micros(),
                    payload,
                    entry.payload_hash.as_bytes().as_slice(),
                    entry.prev_hash.as_bytes().as_slice(),
                    entry.chain_hash.as_bytes().as_slice(),
                    validation,
                    now_millis(),
                ],
            )?;

            Ok(IndexOutcome::Stored)
        })
        .await
        .map_err(join_err)?
    }

    async fn latest(&self) -> Result<Option<HashEntry>, IndexError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            let entry = conn
                .query_row(
                    "SELECT sequence, timestamp_us, message_id, channel_id, message_type, \
                     payload, payload_hash, prev_hash, chain_hash, validation \
                     FROM entries ORDER BY sequence DESC LIMIT 1",
                    [],
                    row_to_entry,
                )
                .optional()?;
            Ok(entry)
        })
        .await
        .map_err(join_err)?
    }

    async fn scan(&self, from_sequence: u64, limit: usize) -> Result<Vec<HashEntry>, IndexError> {
        let conn = Arc::clone(&self.conn);
        let from = i64::try_from(from_sequence).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            let mut stmt = conn.prepare(
                "SELECT sequence, timestamp_us, message_id, channel_id, message_type, \
                 payload, payload_hash, prev_hash, chain_hash, validation \
                 FROM entries WHERE sequence >= ?1 ORDER BY sequence LIMIT ?2",
            )?;
            let entries = stmt
                .query_map(params![from, limit], row_to_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
        .map_err(join_err)?
    }
}

/// Convert a database row into a typed entry.
fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<HashEntry> {
    let sequence: i64 = row.get("sequence")?;

    let timestamp_us: i64 = row.get("timestamp_us")?;
    let timestamp = DateTime::from_timestamp_micros(timestamp_us).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(
            1,
            "timestamp_us".into(),
            rusqlite::types::Type::Integer,
        )
    })?;

    let payload_text: String = row.get("payload")?;
    let payload = serde_json::from_str(&payload_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let validation_blob: Vec<u8> = row.get("validation")?;
    let validation: ValidationSummary = ciborium::from_reader(validation_blob.as_slice())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Blob, Box::new(e))
        })?;

    Ok(HashEntry {
        sequence: sequence as u64,
        timestamp,
        message_id: row.get("message_id")?,
        channel_id: row.get("channel_id")?,
        message_type: row.get("message_type")?,
        payload,
        payload_hash: PayloadHash::from_bytes(hash_column(row, 6, "payload_hash")?),
        prev_hash: ChainHash::from_bytes(hash_column(row, 7, "prev_hash")?),
        chain_hash: ChainHash::from_bytes(hash_column(row, 8, "chain_hash")?),
        validation,
    })
}

/// Read a 32-byte hash column.
fn hash_column(row: &Row<'_>, idx: usize, name: &str) -> rusqlite::Result<[u8; 32]> {
    let bytes: Vec<u8> = row.get(name)?;
    bytes.as_slice().try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(idx, name.to_string(), rusqlite::types::Type::Blob)
    })
}

fn decode_chain_hash(bytes: &[u8]) -> Result<ChainHash, IndexError> {
    ChainHash::try_from(bytes)
        .map_err(|_| IndexError::Decode("chain_hash column is not 32 bytes".into()))
}

fn lock(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>, IndexError> {
    conn.lock().map_err(|_| {
        IndexError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some("connection mutex poisoned".into()),
        ))
    })
}

fn join_err(e: tokio::task::JoinError) -> IndexError {
    IndexError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(format!("spawn_blocking failed: {}", e)),
    ))
}
