//! # chainseal Core
//!
//! Pure primitives for the chainseal audit trail: canonical byte forms,
//! hash entries, input validation, and chain verification.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over the chain's data structures.
//!
//! ## Key Types
//!
//! - [`Record`] - One validated compliance message, as submitted
//! - [`HashEntry`] - The immutable chain-bound entry built from a record
//! - [`ChainHash`] / [`PayloadHash`] - Strongly typed SHA-256 digests
//! - [`VerificationResult`] - Outcome of recomputing a stored chain
//!
//! ## Canonicalization
//!
//! Payloads hash over a canonical JSON form; entries chain over a versioned
//! canonical CBOR preimage. See the [`canonical`] module.

pub mod canonical;
pub mod entry;
pub mod error;
pub mod hash;
pub mod record;
pub mod validation;
pub mod verify;

pub use canonical::{canonical_payload, chain_preimage, MAX_PAYLOAD_DEPTH, PREIMAGE_VERSION};
pub use entry::HashEntry;
pub use error::{EncodingError, ValidationError};
pub use hash::{ChainHash, PayloadHash};
pub use record::{truncate_to_micros, Record, RuleResult, Severity, ValidationSummary};
pub use validation::{validate_record, MAX_IDENTIFIER_LEN};
pub use verify::{verify_chain, verify_linked, BreakReason, VerificationResult};
