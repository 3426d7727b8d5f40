//! # chainseal
//!
//! The unified API for the chainseal audit trail: a tamper-evident,
//! append-only hash chain over validated compliance records.
//!
//! ## Overview
//!
//! Every appended record is sealed into a [`HashEntry`]:
//!
//! - **Payload hash**: SHA-256 over the record's canonical JSON payload
//! - **Chain hash**: SHA-256 over a canonical preimage binding the
//!   payload hash to the previous entry's chain hash
//! - **Genesis**: the first entry links to an all-zero sentinel
//!
//! Any later change to a stored entry, or any reordering, breaks the
//! recomputation and is pinpointed by [`Ledger::audit`].
//!
//! ## Key Concepts
//!
//! - **Entry**: immutable once sealed. Corrections are new records.
//! - **Head**: the chain hash and next sequence; advances only after the
//!   authoritative index acknowledges a write.
//! - **Retention**: an optional write-once archive copy of every entry;
//!   failures degrade the append, never roll it back.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainseal::{Ledger, LedgerConfig};
//! use chainseal::store::SqliteIndex;
//!
//! async fn example() {
//!     let index = Arc::new(SqliteIndex::open("audit.db").unwrap());
//!     let ledger = Ledger::open(index, None, LedgerConfig::default())
//!         .await
//!         .unwrap();
//!
//!     // let receipt = ledger.append(&record).await.unwrap();
//!     // println!("sealed as {}", receipt.entry.chain_hash);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `chainseal::core` - hashing, canonicalization, and verification
//! - `chainseal::store` - index and archive backends

pub mod error;
pub mod ledger;

// Re-export component crates
pub use chainseal_core as core;
pub use chainseal_store as store;

// Re-export main types for convenience
pub use error::AppendError;
pub use ledger::{AppendReceipt, AuditReport, ChainHead, Ledger, LedgerConfig, RetentionStatus};

// Re-export commonly used core types
pub use chainseal_core::{
    verify_chain, verify_linked, BreakReason, ChainHash, HashEntry, PayloadHash, Record,
    RuleResult, Severity, ValidationSummary, VerificationResult,
};
