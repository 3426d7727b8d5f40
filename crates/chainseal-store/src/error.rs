//! Error types for the store gateway.

use thiserror::Error;

/// Errors that can occur while talking to the authoritative index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The index answered with a status the client does not handle.
    #[error("index returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// An entry could not be encoded for storage.
    #[error("encode error: {0}")]
    Encode(String),

    /// A stored entry could not be decoded back into its typed form.
    #[error("decode error: {0}")]
    Decode(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while writing to the retention archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An object for this entry already exists and will not be rewritten.
    #[error("object already archived at {path}")]
    AlreadyArchived { path: String },

    /// The entry could not be serialized into its archive form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
