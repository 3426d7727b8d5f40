//! # Chainseal Testkit
//!
//! Testing utilities for the chainseal audit trail.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known records with pinned hashes for cross-release verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: In-memory stores and record factories for test scenarios
//!
//! ## Golden Vectors
//!
//! Golden vectors ensure deterministic hashing across releases:
//!
//! ```rust
//! use chainseal_testkit::vectors::{all_vectors, generate_entry_from_vector};
//!
//! for vector in all_vectors() {
//!     let entry = generate_entry_from_vector(&vector);
//!     println!("{}: {}", vector.name, entry.chain_hash.to_hex());
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use chainseal_core::{ChainHash, HashEntry};
//! use chainseal_testkit::generators::{record_from_params, RecordParams};
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn chain_hash_is_deterministic(params: RecordParams) {
//!         let record = record_from_params(&params);
//!         let e1 = HashEntry::build(&record, ChainHash::GENESIS, 1).unwrap();
//!         let e2 = HashEntry::build(&record, ChainHash::GENESIS, 1).unwrap();
//!         prop_assert_eq!(e1.chain_hash, e2.chain_hash);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use chainseal_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let chain = fixture.make_chain(3);
//! assert_eq!(chain.len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{FailingArchive, FailingIndex, TestFixture};
pub use generators::{record_from_params, RecordParams};
pub use vectors::{all_vectors, generate_entry_from_vector, verify_all_vectors, GoldenVector};
