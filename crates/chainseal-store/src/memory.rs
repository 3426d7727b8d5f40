//! In-memory implementations of the store traits.
//!
//! Primarily for testing. Same semantics as the persistent backends but
//! everything is lost when the store is dropped.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use chainseal_core::HashEntry;

use crate::error::{ArchiveError, IndexError};
use crate::key::{archive_path, StorageKey};
use crate::traits::{ArchiveStore, IndexOutcome, IndexStore};

/// In-memory index implementation.
///
/// Thread-safe via RwLock. Entries are held ordered by sequence, with a
/// side table from storage key to sequence for duplicate checks.
pub struct MemoryIndex {
    inner: RwLock<MemoryIndexInner>,
}

struct MemoryIndexInner {
    /// Entries ordered by sequence.
    entries: BTreeMap<u64, HashEntry>,
    /// Key index: (partition, message_id) -> sequence.
    keys: HashMap<StorageKey, u64>,
}

impl MemoryIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryIndexInner {
                entries: BTreeMap::new(),
                keys: HashMap::new(),
            }),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStore for MemoryIndex {
    async fn store(&self, entry: &HashEntry) -> Result<IndexOutcome, IndexError> {
        let mut inner = self.inner.write().unwrap();
        let key = StorageKey::for_entry(entry);

        // Occupied key: idempotent retry or a true conflict.
        if let Some(&seq) = inner.keys.get(&key) {
            if let Some(existing) = inner.entries.get(&seq) {
                if existing.chain_hash == entry.chain_hash {
                    return Ok(IndexOutcome::AlreadyStored);
                }
                return Ok(IndexOutcome::Conflict {
                    existing: existing.chain_hash,
                });
            }
        }

        inner.keys.insert(key, entry.sequence);
        inner.entries.insert(entry.sequence, entry.clone());
        Ok(IndexOutcome::Stored)
    }

    async fn latest(&self) -> Result<Option<HashEntry>, IndexError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.last_key_value().map(|(_, e)| e.clone()))
    }

    async fn scan(&self, from_sequence: u64, limit: usize) -> Result<Vec<HashEntry>, IndexError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .entries
            .range(from_sequence..)
            .take(limit)
            .map(|(_, e)| e.clone())
            .collect())
    }
}

/// In-memory archive implementation.
///
/// Objects are keyed by the same relative path `FsArchive` would use, so
/// tests can assert on layout without touching a filesystem.
pub struct MemoryArchive {
    objects: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryArchive {
    /// Create a new empty in-memory archive.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a stored object by its relative path.
    pub fn object(&self, path: &PathBuf) -> Option<Vec<u8>> {
        self.objects.read().unwrap().get(path).cloned()
    }

    /// Number of archived objects.
    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchive {
    async fn store_immutable(&self, entry: &HashEntry) -> Result<(), ArchiveError> {
        let path = archive_path(entry);
        let mut objects = self.objects.write().unwrap();

        if objects.contains_key(&path) {
            return Err(ArchiveError::AlreadyArchived {
                path: path.display().to_string(),
            });
        }

        let bytes = serde_json::to_vec(entry)
            .map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        objects.insert(path, bytes);
        Ok(())
    }
}
