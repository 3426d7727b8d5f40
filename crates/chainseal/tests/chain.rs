//! End-to-end ledger behavior over real and misbehaving stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainseal::core::{canonical_payload, chain_preimage};
use chainseal::store::{
    ArchiveError, ArchiveStore, IndexError, IndexOutcome, IndexStore, MemoryArchive, MemoryIndex,
    SqliteIndex,
};
use chainseal::{
    AppendError, BreakReason, ChainHash, HashEntry, Ledger, LedgerConfig, PayloadHash, Record,
    RetentionStatus, Severity, VerificationResult,
};
use chrono::{DateTime, Utc};
use serde_json::json;

const BASE_MICROS: i64 = 1_705_312_200_000_000; // 2024-01-15T09:50:00Z

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn ts(offset_minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(BASE_MICROS + offset_minutes * 60_000_000).unwrap()
}

fn make_record(message_id: &str) -> Record {
    Record {
        message_id: message_id.to_string(),
        channel_id: "swift-inbound".to_string(),
        message_type: "pacs.008".to_string(),
        timestamp: ts(0),
        payload: json!({"amount": "250.00", "currency": "EUR", "debtor": "DE89370400440532013000"}),
        validation_results: vec![],
        overall_status: Severity::Ok,
    }
}

async fn open_memory_ledger() -> Ledger {
    Ledger::open(
        Arc::new(MemoryIndex::new()),
        Some(Arc::new(MemoryArchive::new())),
        LedgerConfig::default(),
    )
    .await
    .unwrap()
}

// ───── failure doubles ─────

/// Index that fails the next store call, then recovers.
struct FailingIndex {
    inner: MemoryIndex,
    fail_next: AtomicBool,
}

impl FailingIndex {
    fn new() -> Self {
        Self {
            inner: MemoryIndex::new(),
            fail_next: AtomicBool::new(false),
        }
    }

    fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IndexStore for FailingIndex {
    async fn store(&self, entry: &HashEntry) -> Result<IndexOutcome, IndexError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(IndexError::Io(std::io::Error::other("injected failure")));
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

/// Index that commits the next write but never acknowledges it, like a
/// network partition between the commit and the response.
struct AckLossIndex {
    inner: MemoryIndex,
    swallow_next: AtomicBool,
}

impl AckLossIndex {
    fn new() -> Self {
        Self {
            inner: MemoryIndex::new(),
            swallow_next: AtomicBool::new(false),
        }
    }

    fn swallow_next(&self) {
        self.swallow_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IndexStore for AckLossIndex {
    async fn store(&self, entry: &HashEntry) -> Result<IndexOutcome, IndexError> {
        let outcome = self.inner.store(entry).await?;
        if self.swallow_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(outcome)
    }

    async fn latest(&self) -> Result<Option<HashEntry>, IndexError> {
        self.inner.latest().await
    }

    async fn scan(&self, from_sequence: u64, limit: usize) -> Result<Vec<HashEntry>, IndexError> {
        self.inner.scan(from_sequence, limit).await
    }
}

/// Archive whose volume is permanently offline.
struct FailingArchive;

#[async_trait]
impl ArchiveStore for FailingArchive {
    async fn store_immutable(&self, _entry: &HashEntry) -> Result<(), ArchiveError> {
        Err(ArchiveError::Io(std::io::Error::other(
            "archive volume offline",
        )))
    }
}

// ───── chain growth ─────

#[tokio::test]
async fn chain_grows_and_verifies() {
    let ledger = open_memory_ledger().await;

    for i in 1..=10 {
        let mut record = make_record(&format!("msg-{i:04}"));
        record.timestamp = ts(i);
        ledger.append(&record).await.unwrap();
    }

    let report = ledger.audit(1, 100).await.unwrap();
    assert_eq!(report.entries.len(), 10);
    assert!(report.result.is_valid());

    // Each entry links to its predecessor.
    assert!(report.entries[0].prev_hash.is_genesis());
    for pair in report.entries.windows(2) {
        assert_eq!(pair[1].prev_hash, pair[0].chain_hash);
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
    }
}

#[tokio::test]
async fn sealed_entries_recompute_from_first_principles() {
    let ledger = open_memory_ledger().await;

    let mut first = make_record("pacs008-20240115-0001");
    first.payload = json!({"amount": "250.00", "currency": "EUR"});
    let mut second = make_record("pacs008-20240115-0002");
    second.timestamp = ts(1);
    second.payload = json!({"amount": "1780.50", "currency": "USD"});

    let r1 = ledger.append(&first).await.unwrap();
    let r2 = ledger.append(&second).await.unwrap();

    // Recompute both hashes of the second entry from its recorded fields.
    let canonical = canonical_payload(&r2.entry.payload).unwrap();
    assert_eq!(PayloadHash::digest(&canonical), r2.entry.payload_hash);

    let preimage = chain_preimage(
        r2.entry.timestamp.timestamp_micros(),
        &r2.entry.message_id,
        &r2.entry.payload_hash,
        &r2.entry.prev_hash,
    );
    assert_eq!(ChainHash::digest(&preimage), r2.entry.chain_hash);

    // And the link structure is exactly genesis -> first -> second.
    assert!(r1.entry.prev_hash.is_genesis());
    assert_eq!(r2.entry.prev_hash, r1.entry.chain_hash);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_never_fork() {
    init_tracing();
    let ledger = Arc::new(
        Ledger::open(
            Arc::new(MemoryIndex::new()),
            None,
            LedgerConfig::default(),
        )
        .await
        .unwrap(),
    );

    let mut handles = Vec::new();
    for writer in 0..4 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                let record = make_record(&format!("writer{writer}-msg{i:03}"));
                ledger.append(&record).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(ledger.next_sequence(), 101);

    // Interleaving must never fork or gap the chain.
    let report = ledger.audit(1, 200).await.unwrap();
    assert_eq!(report.entries.len(), 100);
    assert!(report.result.is_valid());
    let sequences: Vec<u64> = report.entries.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, (1..=100).collect::<Vec<_>>());
}

// ───── duplicates and failures ─────

#[tokio::test]
async fn duplicate_message_id_is_rejected_without_advancing() {
    let ledger = open_memory_ledger().await;

    ledger.append(&make_record("msg-0001")).await.unwrap();
    let head = ledger.current_head();

    // Same message id, different content.
    let mut replay = make_record("msg-0001");
    replay.payload = json!({"amount": "999999.00"});
    let err = ledger.append(&replay).await.unwrap_err();
    assert!(matches!(
        err,
        AppendError::DuplicateMessageId { ref message_id } if message_id == "msg-0001"
    ));
    assert_eq!(ledger.current_head(), head);

    // A fresh id continues the chain from the unchanged head.
    let receipt = ledger.append(&make_record("msg-0002")).await.unwrap();
    assert_eq!(receipt.entry.sequence, 2);
    assert_eq!(receipt.entry.prev_hash, head.hash);
}

#[tokio::test]
async fn index_failure_leaves_ledger_usable() {
    let index = Arc::new(FailingIndex::new());
    let ledger = Ledger::open(index.clone(), None, LedgerConfig::default())
        .await
        .unwrap();

    ledger.append(&make_record("msg-0001")).await.unwrap();
    let head = ledger.current_head();

    index.fail_next();
    let err = ledger.append(&make_record("msg-0002")).await.unwrap_err();
    assert!(matches!(err, AppendError::Index(_)));
    assert_eq!(ledger.current_head(), head);

    // The same record seals cleanly once the index recovers.
    let receipt = ledger.append(&make_record("msg-0002")).await.unwrap();
    assert_eq!(receipt.entry.sequence, 2);
    assert!(ledger.audit(1, 10).await.unwrap().result.is_valid());
}

#[tokio::test]
async fn retry_after_lost_ack_is_idempotent() {
    let index = Arc::new(AckLossIndex::new());
    let ledger = Ledger::open(
        index.clone(),
        None,
        LedgerConfig {
            store_timeout: Duration::from_millis(50),
            retention_timeout: Duration::from_millis(50),
        },
    )
    .await
    .unwrap();

    let record = make_record("msg-0001");

    index.swallow_next();
    let err = ledger.append(&record).await.unwrap_err();
    assert!(matches!(err, AppendError::StoreTimeout { .. }));
    assert_eq!(ledger.next_sequence(), 1);

    // The write actually committed; retrying the same record must succeed
    // exactly once rather than duplicating or conflicting.
    let receipt = ledger.append(&record).await.unwrap();
    assert_eq!(receipt.entry.sequence, 1);
    assert_eq!(ledger.next_sequence(), 2);

    let report = ledger.audit(1, 10).await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert!(report.result.is_valid());
}

#[tokio::test]
async fn retention_failure_degrades_but_seals() {
    let ledger = Ledger::open(
        Arc::new(MemoryIndex::new()),
        Some(Arc::new(FailingArchive)),
        LedgerConfig::default(),
    )
    .await
    .unwrap();

    let receipt = ledger.append(&make_record("msg-0001")).await.unwrap();
    assert!(matches!(receipt.retention, RetentionStatus::Failed(_)));

    // The entry is committed regardless of the archive.
    assert_eq!(ledger.next_sequence(), 2);
    let report = ledger.audit(1, 10).await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert!(report.result.is_valid());
}

// ───── persistence and tampering ─────

#[tokio::test]
async fn head_recovers_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.db");

    let head = {
        let index = Arc::new(SqliteIndex::open(&path).unwrap());
        let ledger = Ledger::open(index, None, LedgerConfig::default())
            .await
            .unwrap();
        for i in 1..=3 {
            ledger
                .append(&make_record(&format!("msg-{i:04}")))
                .await
                .unwrap();
        }
        ledger.current_head()
    };

    let index = Arc::new(SqliteIndex::open(&path).unwrap());
    let ledger = Ledger::open(index, None, LedgerConfig::default())
        .await
        .unwrap();
    assert_eq!(ledger.current_head(), head);

    // The chain continues where it left off.
    let receipt = ledger.append(&make_record("msg-0004")).await.unwrap();
    assert_eq!(receipt.entry.sequence, 4);
    assert_eq!(receipt.entry.prev_hash, head.hash);
    assert!(ledger.audit(1, 10).await.unwrap().result.is_valid());
}

#[tokio::test]
async fn audit_pinpoints_on_disk_tampering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.db");

    {
        let index = Arc::new(SqliteIndex::open(&path).unwrap());
        let ledger = Ledger::open(index, None, LedgerConfig::default())
            .await
            .unwrap();
        for i in 1..=3 {
            ledger
                .append(&make_record(&format!("msg-{i:04}")))
                .await
                .unwrap();
        }
    }

    // Edit the stored payload of the second entry behind the ledger's back.
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE entries SET payload = ?1 WHERE sequence = 2",
            rusqlite::params![r#"{"amount":"999999.00","currency":"EUR"}"#],
        )
        .unwrap();
    }

    let index = Arc::new(SqliteIndex::open(&path).unwrap());
    let ledger = Ledger::open(index, None, LedgerConfig::default())
        .await
        .unwrap();
    let report = ledger.audit(1, 10).await.unwrap();
    assert_eq!(
        report.result,
        VerificationResult::Broken {
            at_index: 1,
            reason: BreakReason::HashMismatch
        }
    );
}

// ───── audit windows ─────

#[tokio::test]
async fn audit_windows_anchor_on_stored_predecessor() {
    let ledger = open_memory_ledger().await;
    for i in 1..=5 {
        ledger
            .append(&make_record(&format!("msg-{i:04}")))
            .await
            .unwrap();
    }

    let window = ledger.audit(3, 2).await.unwrap();
    assert_eq!(window.entries.len(), 2);
    assert_eq!(window.entries[0].sequence, 3);
    assert_eq!(window.entries[1].sequence, 4);
    assert!(window.result.is_valid());

    // Past the head there is nothing to verify.
    let empty = ledger.audit(6, 10).await.unwrap();
    assert!(empty.entries.is_empty());
    assert!(empty.result.is_valid());

    // from 0 is treated as the start of the chain.
    let full = ledger.audit(0, 100).await.unwrap();
    assert_eq!(full.entries.len(), 5);
}
