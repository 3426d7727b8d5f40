//! Storage keys: where an entry lives in the index and in the archive.
//!
//! Entries are partitioned by the UTC day of their own timestamp, not the
//! day they were ingested. Replayed history therefore lands in the same
//! partition it originally belonged to.

use std::path::PathBuf;

use chainseal_core::HashEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Composite key identifying an entry within the index.
///
/// The partition is the entry's UTC day in `YYYY.MM.DD` form. Together with
/// the message id it is unique across the whole trail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    /// UTC day partition, e.g. `2024.01.15`.
    pub partition: String,
    /// Message identifier, unique within the partition.
    pub message_id: String,
}

impl StorageKey {
    /// Build the key for an entry from its own timestamp.
    pub fn for_entry(entry: &HashEntry) -> Self {
        Self::new(entry.timestamp, &entry.message_id)
    }

    pub fn new(timestamp: DateTime<Utc>, message_id: &str) -> Self {
        Self {
            partition: timestamp.format("%Y.%m.%d").to_string(),
            message_id: message_id.to_string(),
        }
    }

    /// Daily index name under a prefix, e.g. `audit-2024.01.15`.
    pub fn index_name(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.partition)
    }
}

/// Relative archive path for an entry: `YYYY/MM/DD/<channel>/<message_id>.json`.
///
/// Channel and message ids pass identifier validation before an entry is
/// built, so neither can smuggle path separators in here.
pub fn archive_path(entry: &HashEntry) -> PathBuf {
    let day = entry.timestamp.format("%Y/%m/%d").to_string();
    PathBuf::from(day)
        .join(&entry.channel_id)
        .join(format!("{}.json", entry.message_id))
}
