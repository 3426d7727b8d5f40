//! Filesystem implementation of the retention archive.
//!
//! One JSON object per entry, laid out by day and channel under the
//! archive root: `YYYY/MM/DD/<channel_id>/<message_id>.json`. Objects
//! are created with `create_new` and made read-only once complete, so
//! an archived entry can never be silently rewritten.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chainseal_core::HashEntry;
use tracing::debug;

use crate::error::ArchiveError;
use crate::key::archive_path;
use crate::traits::ArchiveStore;

/// Filesystem-backed archive rooted at a directory.
#[derive(Clone)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    /// Open an archive rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The archive root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path the given entry is (or would be) archived at.
    pub fn object_path(&self, entry: &HashEntry) -> PathBuf {
        self.root.join(archive_path(entry))
    }
}

#[async_trait]
impl ArchiveStore for FsArchive {
    async fn store_immutable(&self, entry: &HashEntry) -> Result<(), ArchiveError> {
        let path = self.object_path(entry);
        let entry = entry.clone();

        tokio::task::spawn_blocking(move || write_object(&path, &entry))
            .await
            .map_err(|e| {
                ArchiveError::Io(std::io::Error::other(format!(
                    "spawn_blocking failed: {}",
                    e
                )))
            })?
    }
}

fn write_object(path: &Path, entry: &HashEntry) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(ArchiveError::AlreadyArchived {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, entry)
        .map_err(|e| ArchiveError::Serialization(e.to_string()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    // Finished objects lose their write bit.
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)?;

    debug!(path = %path.display(), "archived entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainseal_core::{ChainHash, Record, Severity};
    use chrono::DateTime;
    use serde_json::json;

    fn make_test_entry(message_id: &str) -> HashEntry {
        let record = Record {
            message_id: message_id.to_string(),
            channel_id: "adt-inbound".to_string(),
            message_type: "ADT.A01".to_string(),
            timestamp: DateTime::from_timestamp_micros(1_705_312_200_000_000).unwrap(),
            payload: json!({"patient_id": "12345"}),
            validation_results: vec![],
            overall_status: Severity::Ok,
        };
        HashEntry::build(&record, ChainHash::GENESIS, 1).unwrap()
    }

    #[tokio::test]
    async fn test_archive_writes_readonly_object() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::open(dir.path()).unwrap();
        let entry = make_test_entry("msg-0001");

        archive.store_immutable(&entry).await.unwrap();

        let path = dir
            .path()
            .join("2024/01/15/adt-inbound/msg-0001.json");
        assert_eq!(archive.object_path(&entry), path);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
        let stored: HashEntry = serde_json::from_str(&content).unwrap();
        assert_eq!(stored, entry);

        let perms = fs::metadata(&path).unwrap().permissions();
        assert!(perms.readonly());
    }

    #[tokio::test]
    async fn test_archive_refuses_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::open(dir.path()).unwrap();
        let entry = make_test_entry("msg-0001");

        archive.store_immutable(&entry).await.unwrap();
        let before = fs::read(archive.object_path(&entry)).unwrap();

        let err = archive.store_immutable(&entry).await.unwrap_err();
        assert!(matches!(err, ArchiveError::AlreadyArchived { .. }));

        // The original object is untouched.
        let after = fs::read(archive.object_path(&entry)).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_archive_separates_channels() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::open(dir.path()).unwrap();

        let mut entry = make_test_entry("msg-0001");
        archive.store_immutable(&entry).await.unwrap();

        entry.channel_id = "lab-inbound".to_string();
        archive.store_immutable(&entry).await.unwrap();

        assert!(dir.path().join("2024/01/15/adt-inbound/msg-0001.json").exists());
        assert!(dir.path().join("2024/01/15/lab-inbound/msg-0001.json").exists());
    }
}
