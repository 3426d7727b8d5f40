//! The Ledger: unified append and audit API for the hash chain.
//!
//! The ledger owns the chain head and serializes appends against it.
//! Every record is sealed into a [`HashEntry`] linked to the previous
//! one, written to the authoritative index, and then copied to the
//! retention archive on a best-effort basis.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chainseal_core::{
    validate_record, verify_chain, verify_linked, ChainHash, HashEntry, Record,
    VerificationResult,
};
use chainseal_store::{
    ArchiveError, ArchiveStore, IndexError, IndexOutcome, IndexStore, StorageKey,
};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::AppendError;

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How long to wait for the authoritative index before giving up.
    pub store_timeout: Duration,
    /// How long to wait for the retention archive before degrading.
    pub retention_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            retention_timeout: Duration::from_secs(5),
        }
    }
}

/// The committed head of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHead {
    /// Chain hash of the last sealed entry, or the genesis sentinel.
    pub hash: ChainHash,
    /// Sequence the next entry will take. Starts at 1.
    pub next_sequence: u64,
}

impl ChainHead {
    /// The head of an empty chain.
    pub fn genesis() -> Self {
        Self {
            hash: ChainHash::GENESIS,
            next_sequence: 1,
        }
    }
}

/// What happened to the retention copy of an appended entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionStatus {
    /// The archive holds an immutable copy.
    Archived,
    /// The archive write failed; the entry is sealed but not yet copied.
    Failed(String),
    /// No archive is configured.
    Disabled,
}

/// Proof of a completed append.
#[derive(Debug, Clone)]
pub struct AppendReceipt {
    /// The sealed entry, exactly as stored.
    pub entry: HashEntry,
    /// Where the entry lives in the index.
    pub storage_key: StorageKey,
    /// Outcome of the retention copy.
    pub retention: RetentionStatus,
}

/// A verified window of the chain.
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// The entries in the window, ordered by sequence.
    pub entries: Vec<HashEntry>,
    /// Verification outcome over the window.
    pub result: VerificationResult,
}

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Appending validated records as hash-chained entries
/// - Reading the committed chain head
/// - Auditing stored windows of the chain
pub struct Ledger {
    /// The authoritative index.
    index: Arc<dyn IndexStore>,
    /// Optional retention archive.
    archive: Option<Arc<dyn ArchiveStore>>,
    /// Configuration.
    config: LedgerConfig,
    /// Serializes appends; hash chaining admits one writer at a time.
    append_lock: Mutex<()>,
    /// Committed head, readable without taking the append lock.
    head: RwLock<ChainHead>,
}

impl Ledger {
    /// Open a ledger over the given stores, recovering the head from the
    /// highest-sequence entry the index already holds.
    pub async fn open(
        index: Arc<dyn IndexStore>,
        archive: Option<Arc<dyn ArchiveStore>>,
        config: LedgerConfig,
    ) -> Result<Self, IndexError> {
        let head = match index.latest().await? {
            Some(entry) => {
                info!(
                    sequence = entry.sequence,
                    chain_hash = %entry.chain_hash,
                    "resuming chain from stored head"
                );
                ChainHead {
                    hash: entry.chain_hash,
                    next_sequence: entry.sequence + 1,
                }
            }
            None => {
                info!("starting new chain at genesis");
                ChainHead::genesis()
            }
        };

        Ok(Self {
            index,
            archive,
            config,
            append_lock: Mutex::new(()),
            head: RwLock::new(head),
        })
    }

    /// The committed chain head.
    pub fn current_head(&self) -> ChainHead {
        *self.head.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sequence the next appended entry will take.
    pub fn next_sequence(&self) -> u64 {
        self.current_head().next_sequence
    }

    /// Whether a retention archive is configured.
    pub fn retention_enabled(&self) -> bool {
        self.archive.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Append
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal a record onto the chain.
    ///
    /// The head advances only after the authoritative index acknowledges
    /// the write. On any error the head is unchanged and the ledger stays
    /// usable; a timed-out write may be retried with the same record.
    pub async fn append(&self, record: &Record) -> Result<AppendReceipt, AppendError> {
        validate_record(record)?;

        let guard = self.append_lock.lock().await;

        let head = self.current_head();
        let entry = HashEntry::build(record, head.hash, head.next_sequence)?;
        let storage_key = StorageKey::for_entry(&entry);

        let outcome = match timeout(self.config.store_timeout, self.index.store(&entry)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!(
                    message_id = %entry.message_id,
                    error = %e,
                    "authoritative index write failed; head unchanged"
                );
                return Err(e.into());
            }
            Err(_) => {
                let timeout_ms = self.config.store_timeout.as_millis() as u64;
                error!(
                    message_id = %entry.message_id,
                    timeout_ms,
                    "authoritative index write timed out; head unchanged"
                );
                return Err(AppendError::StoreTimeout { timeout_ms });
            }
        };

        match outcome {
            IndexOutcome::Stored => {}
            IndexOutcome::AlreadyStored => {
                // A retry after a lost acknowledgement: the identical entry
                // is already committed, so the head may now advance.
                info!(
                    message_id = %entry.message_id,
                    sequence = entry.sequence,
                    "entry was already committed; acknowledging retry"
                );
            }
            IndexOutcome::Conflict { existing } => {
                warn!(
                    message_id = %entry.message_id,
                    existing = %existing,
                    "rejected append: message id already sealed with different content"
                );
                return Err(AppendError::DuplicateMessageId {
                    message_id: record.message_id.clone(),
                });
            }
        }

        self.advance_head(&entry);
        debug!(
            sequence = entry.sequence,
            chain_hash = %entry.chain_hash,
            "entry sealed"
        );

        // Retention runs outside the append lock so a slow archive never
        // stalls the next writer.
        drop(guard);
        let retention = self.archive_entry(&entry).await;

        Ok(AppendReceipt {
            entry,
            storage_key,
            retention,
        })
    }

    fn advance_head(&self, entry: &HashEntry) {
        let mut head = self.head.write().unwrap_or_else(PoisonError::into_inner);
        head.hash = entry.chain_hash;
        head.next_sequence = entry.sequence + 1;
    }

    async fn archive_entry(&self, entry: &HashEntry) -> RetentionStatus {
        let Some(archive) = &self.archive else {
            return RetentionStatus::Disabled;
        };

        match timeout(self.config.retention_timeout, archive.store_immutable(entry)).await {
            Ok(Ok(())) => RetentionStatus::Archived,
            // An existing object already satisfies retention.
            Ok(Err(ArchiveError::AlreadyArchived { .. })) => RetentionStatus::Archived,
            Ok(Err(e)) => {
                warn!(
                    message_id = %entry.message_id,
                    error = %e,
                    "retention write failed; entry remains sealed"
                );
                RetentionStatus::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    message_id = %entry.message_id,
                    "retention write timed out; entry remains sealed"
                );
                RetentionStatus::Failed(format!(
                    "timed out after {} ms",
                    self.config.retention_timeout.as_millis()
                ))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audit
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify a stored window of the chain.
    ///
    /// Reads up to `limit` entries starting at `from_sequence` and checks
    /// both every entry's recorded hashes and the links between entries.
    /// Windows starting past the first entry are anchored on the stored
    /// predecessor when it exists.
    pub async fn audit(
        &self,
        from_sequence: u64,
        limit: usize,
    ) -> Result<AuditReport, IndexError> {
        let from = from_sequence.max(1);

        if from == 1 {
            let entries = self.index.scan(1, limit).await?;
            let result = verify_chain(&entries);
            return Ok(AuditReport { entries, result });
        }

        // Fetch one extra leading entry to anchor the first link.
        let mut entries = self.index.scan(from - 1, limit.saturating_add(1)).await?;
        let anchor = if entries.first().map(|e| e.sequence) == Some(from - 1) {
            entries.remove(0).chain_hash
        } else if let Some(first) = entries.first() {
            // No stored predecessor; the first link is taken at face value
            // and everything from there on is fully checked.
            first.prev_hash
        } else {
            return Ok(AuditReport {
                entries,
                result: VerificationResult::Valid,
            });
        };
        entries.truncate(limit);

        let result = verify_linked(anchor, &entries);
        Ok(AuditReport { entries, result })
    }
}
