//! Store traits: the abstract interfaces for entry persistence.
//!
//! The ledger is storage-agnostic. The authoritative index can be SQLite,
//! an HTTP document index, or in-memory (for tests); the retention archive
//! can be a filesystem tree or in-memory.

use async_trait::async_trait;
use chainseal_core::{ChainHash, HashEntry};

use crate::error::{ArchiveError, IndexError};

/// Result of writing an entry to the authoritative index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Entry was written successfully.
    Stored,
    /// The exact same entry already exists (idempotent, not an error).
    AlreadyStored,
    /// A different entry already occupies this storage key.
    Conflict {
        /// Chain hash of the entry that is already stored.
        existing: ChainHash,
    },
}

/// The authoritative index: the store whose write decides whether an
/// append committed.
///
/// # Design Notes
///
/// - **Idempotent writes**: storing the same entry twice returns
///   `AlreadyStored`.
/// - **Conflict detection**: storing a different entry under an occupied
///   key returns `Conflict` with the existing chain hash.
/// - **Head recovery**: `latest` returns the highest-sequence entry so a
///   restarted ledger can resume the chain where it left off.
///
/// All methods are async. Blocking backends (SQLite, filesystem) use
/// `spawn_blocking` internally to stay off the runtime threads.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Write an entry under its storage key.
    async fn store(&self, entry: &HashEntry) -> Result<IndexOutcome, IndexError>;

    /// The entry with the highest sequence, or `None` if the index is empty.
    async fn latest(&self) -> Result<Option<HashEntry>, IndexError>;

    /// Entries with `sequence >= from_sequence`, ordered by sequence,
    /// at most `limit` of them.
    async fn scan(&self, from_sequence: u64, limit: usize) -> Result<Vec<HashEntry>, IndexError>;
}

/// The retention archive: a write-once copy of each entry kept outside
/// the index.
///
/// Archive writes are best-effort from the ledger's point of view. A
/// failure here degrades retention but never rolls back a committed
/// append.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Persist an immutable copy of the entry.
    ///
    /// Returns `AlreadyArchived` if an object for this entry exists;
    /// existing objects are never rewritten.
    async fn store_immutable(&self, entry: &HashEntry) -> Result<(), ArchiveError>;
}
