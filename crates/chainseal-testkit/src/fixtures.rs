//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: in-memory stores, record
//! factories with distinct ids, and misbehaving store doubles.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chainseal::{Ledger, LedgerConfig};
use chainseal_core::{ChainHash, HashEntry, Record, RuleResult, Severity};
use chainseal_store::{
    ArchiveError, ArchiveStore, IndexError, IndexOutcome, IndexStore, MemoryArchive, MemoryIndex,
};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Default base event time for fixture records: 2024-01-15T09:50:00Z.
const BASE_MICROS: i64 = 1_705_312_200_000_000;

/// A test fixture with in-memory index and archive stores.
pub struct TestFixture {
    pub index: Arc<MemoryIndex>,
    pub archive: Arc<MemoryArchive>,
    counter: AtomicU64,
    base_micros: i64,
}

impl TestFixture {
    /// Create a new fixture over empty stores.
    pub fn new() -> Self {
        Self::with_base_time(BASE_MICROS)
    }

    /// Create with a specific base event time, in microseconds since epoch.
    pub fn with_base_time(base_micros: i64) -> Self {
        Self {
            index: Arc::new(MemoryIndex::new()),
            archive: Arc::new(MemoryArchive::new()),
            counter: AtomicU64::new(0),
            base_micros,
        }
    }

    /// Open a ledger over this fixture's stores.
    pub async fn ledger(&self) -> Ledger {
        Ledger::open(
            self.index.clone(),
            Some(self.archive.clone()),
            LedgerConfig::default(),
        )
        .await
        .expect("memory stores open without error")
    }

    /// The event time `offset_seconds` past the fixture's base time.
    pub fn event_time(&self, offset_seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.base_micros + offset_seconds * 1_000_000)
            .expect("fixture event time within range")
    }

    /// Create a payment record with a fresh message id and advancing time.
    pub fn next_record(&self) -> Record {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut record = self.make_record(&format!("msg-{n:04}"));
        record.timestamp = self.event_time(n as i64);
        record
    }

    /// Create a clean payment record with the given message id.
    ///
    /// Calling this twice with the same id returns the same record, which
    /// is exactly what idempotency tests need.
    pub fn make_record(&self, message_id: &str) -> Record {
        Record {
            message_id: message_id.to_string(),
            channel_id: "swift-inbound".to_string(),
            message_type: "pacs.008".to_string(),
            timestamp: self.event_time(0),
            payload: json!({
                "amount": "250.00",
                "currency": "EUR",
                "reference": message_id,
            }),
            validation_results: vec![],
            overall_status: Severity::Ok,
        }
    }

    /// Create a record flagged by an upstream validation rule.
    pub fn make_flagged_record(&self, message_id: &str) -> Record {
        let mut record = self.make_record(message_id);
        record.validation_results = vec![RuleResult {
            rule_id: "iban-checksum".to_string(),
            passed: false,
            severity: Severity::Warn,
            message: "debtor IBAN failed checksum".to_string(),
        }];
        record.overall_status = Severity::Warn;
        record
    }

    /// Build a linked chain of `len` entries without touching any store.
    pub fn make_chain(&self, len: u64) -> Vec<HashEntry> {
        let mut entries = Vec::with_capacity(len as usize);
        let mut prev = ChainHash::GENESIS;
        for seq in 1..=len {
            let mut record = self.make_record(&format!("chain-{seq:04}"));
            record.timestamp = self.event_time(seq as i64);
            let entry = HashEntry::build(&record, prev, seq).expect("fixture records build");
            prev = entry.chain_hash;
            entries.push(entry);
        }
        entries
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

// ───── store doubles ─────

/// Index that refuses store calls while `set_failing(true)` is in effect.
///
/// Reads always pass through, so a ledger can still recover its head while
/// the write path is down.
pub struct FailingIndex {
    inner: MemoryIndex,
    failing: AtomicBool,
}

impl FailingIndex {
    pub fn new() -> Self {
        Self {
            inner: MemoryIndex::new(),
            failing: AtomicBool::new(false),
        }
    }

    /// Toggle whether store calls fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for FailingIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStore for FailingIndex {
    async fn store(&self, entry: &HashEntry) -> Result<IndexOutcome, IndexError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexError::Io(std::io::Error::other("index write refused")));
        }
        self.inner.store(entry).await
    }

    async fn latest(&self) -> Result<Option<HashEntry>, IndexError> {
        self.inner.latest().await
    }

    async fn scan(&self, from_sequence: u64, limit: usize) -> Result<Vec<HashEntry>, IndexError> {
        self.inner.scan(from_sequence, limit).await
    }
}

/// Archive that refuses every write.
#[derive(Default)]
pub struct FailingArchive;

#[async_trait]
impl ArchiveStore for FailingArchive {
    async fn store_immutable(&self, _entry: &HashEntry) -> Result<(), ArchiveError> {
        Err(ArchiveError::Io(std::io::Error::other(
            "archive volume offline",
        )))
    }
}
