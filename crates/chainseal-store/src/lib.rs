//! # chainseal Store
//!
//! Storage gateway for the audit trail: the [`IndexStore`] and
//! [`ArchiveStore`] traits plus their backends.
//!
//! ## Backends
//!
//! - [`SqliteIndex`]: embedded single-file authoritative index
//! - [`HttpIndex`]: Elasticsearch-compatible document index over HTTP
//! - [`FsArchive`]: write-once JSON objects on the local filesystem
//! - [`MemoryIndex`] / [`MemoryArchive`]: in-memory doubles for tests
//!
//! Every backend gives `store` the same semantics: writing the same
//! entry twice is idempotent, and writing a different entry under an
//! occupied storage key reports a conflict instead of overwriting.

pub mod error;
pub mod fs;
pub mod http;
pub mod key;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{ArchiveError, IndexError};
pub use fs::FsArchive;
pub use http::HttpIndex;
pub use key::{archive_path, StorageKey};
pub use memory::{MemoryArchive, MemoryIndex};
pub use sqlite::SqliteIndex;
pub use traits::{ArchiveStore, IndexOutcome, IndexStore};
