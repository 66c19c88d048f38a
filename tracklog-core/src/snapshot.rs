//! On-disk mirror of pending entries
//!
//! The store is stateless apart from its path. Every operation is
//! best-effort: failures are logged and reported as `false`/`None`. When no
//! data directory can be resolved the store is inert.
//!
//! Writes go through a temp file, `sync_all` and a rename, so the snapshot
//! is always either the previous or the new version, never a torn file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::config::CollectorConfig;
use crate::entry::Entry;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: Option<PathBuf>,
}

impl SnapshotStore {
    /// Store backed by a specific file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store that never touches the filesystem
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Store at the configured snapshot path, or inert if none resolves
    pub fn from_config(config: &CollectorConfig) -> Self {
        match config.snapshot_path() {
            Some(path) => Self::new(path),
            None => {
                tracing::warn!("No data directory available, snapshots disabled");
                Self::disabled()
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace the snapshot with `entries`
    pub fn write(&self, entries: &[Entry]) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let Some(data) = codec::encode(entries) else {
            return false;
        };

        match atomic_write(path, &data) {
            Ok(()) => {
                tracing::trace!(path = %path.display(), count = entries.len(), "Snapshot written");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write snapshot");
                false
            }
        }
    }

    /// Load the snapshot, `None` if absent or unreadable
    pub fn read(&self) -> Option<Vec<Entry>> {
        let path = self.path.as_ref()?;

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read snapshot");
                return None;
            }
        };

        codec::decode(&data)
    }

    /// Delete the snapshot; a missing file counts as success
    pub fn remove(&self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };

        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove snapshot");
                false
            }
        }
    }
}

/// Write `content` to a sibling temp file, sync it and rename over `path`
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&temp_path)?;
    file.write_all(content)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}
