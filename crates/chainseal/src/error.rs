//! Error types for the ledger.

use chainseal_core::{EncodingError, ValidationError};
use chainseal_store::IndexError;
use thiserror::Error;

/// Errors that can occur while appending a record.
#[derive(Debug, Error)]
pub enum AppendError {
    /// The record failed intake validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The record's payload could not be canonicalized for hashing.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// A different entry is already sealed under this message id.
    #[error("message {message_id} is already sealed with different content")]
    DuplicateMessageId { message_id: String },

    /// The authoritative index write failed. The head has not advanced.
    #[error("authoritative index write failed: {0}")]
    Index(#[from] IndexError),

    /// The authoritative index write did not finish in time. Whether it
    /// committed is unknown; retrying with the same record is safe.
    #[error("authoritative index write timed out after {timeout_ms} ms")]
    StoreTimeout { timeout_ms: u64 },
}
