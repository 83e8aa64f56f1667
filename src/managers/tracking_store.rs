//! Tracking Store for raindrop-sync.
//!
//! Implements `TrackingStoreTrait`: an append-only history of the raindrops
//! that have already been turned into tasks. Every append writes a brand-new
//! numbered snapshot file and then repoints a small pointer file at it; old
//! snapshots are never touched again.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info};

use crate::types::config::StoreConfig;
use crate::types::errors::StoreError;
use crate::types::tracked::{Snapshot, TrackedItem};

const SNAPSHOT_STEM: &str = "_processed_raindrops_";

/// Trait defining tracking store operations.
pub trait TrackingStoreTrait {
    /// Returns the snapshot the pointer file references, creating an empty
    /// first snapshot if the store has never been written.
    fn latest_snapshot(&self) -> Result<Snapshot, StoreError>;
    /// Writes `latest + new_items` as a new snapshot and repoints to it.
    /// Returns the path of the snapshot that is current afterwards.
    fn append(&self, new_items: &[TrackedItem]) -> Result<PathBuf, StoreError>;
    /// Path of the snapshot the pointer file references.
    fn current_snapshot_path(&self) -> Result<PathBuf, StoreError>;

    fn tracked_ids(&self) -> Result<HashSet<i64>, StoreError> {
        Ok(self.latest_snapshot()?.ids())
    }
}

/// Tracking store backed by JSON snapshot files and a pointer file.
pub struct TrackingStore {
    snapshot_dir: PathBuf,
    pointer_path: PathBuf,
}

impl TrackingStore {
    /// Creates a store over the configured locations. Nothing is touched on
    /// disk until the first read or write.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            snapshot_dir: config.snapshot_dir.clone(),
            pointer_path: config.pointer_path.clone(),
        }
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    pub fn pointer_path(&self) -> &Path {
        &self.pointer_path
    }

    /// Builds `{seq:03}_processed_raindrops_{YYYYMMDD_HHMM}.json`.
    pub fn snapshot_file_name(sequence: u32, created: DateTime<Local>) -> String {
        format!(
            "{:03}{}{}.json",
            sequence,
            SNAPSHOT_STEM,
            created.format("%Y%m%d_%H%M")
        )
    }

    /// Extracts the sequence number from a snapshot file name, or `None` if
    /// the name is not a snapshot.
    pub fn parse_sequence(file_name: &str) -> Option<u32> {
        let (digits, rest) = file_name.split_once('_')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let rest = format!("_{}", rest);
        if !rest.starts_with(SNAPSHOT_STEM) || !rest.ends_with(".json") {
            return None;
        }
        digits.parse().ok()
    }

    fn ensure_dirs(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.snapshot_dir).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create snapshot directory {}: {}",
                self.snapshot_dir.display(),
                e
            ))
        })?;
        if let Some(parent) = self.pointer_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!(
                    "Failed to create pointer directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Every snapshot file currently on disk, ordered by sequence number.
    fn snapshot_files(&self) -> Result<Vec<(u32, PathBuf)>, StoreError> {
        let entries = fs::read_dir(&self.snapshot_dir).map_err(|e| {
            StoreError::Io(format!(
                "Failed to list {}: {}",
                self.snapshot_dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            if let Some(seq) = entry.file_name().to_str().and_then(Self::parse_sequence) {
                files.push((seq, entry.path()));
            }
        }
        files.sort_unstable();
        Ok(files)
    }

    fn next_sequence(&self) -> Result<u32, StoreError> {
        Ok(self
            .snapshot_files()?
            .last()
            .map_or(1, |(last, _)| last + 1))
    }

    /// Follows the pointer file to the current snapshot, bootstrapping an
    /// empty store when neither pointer nor snapshots exist yet.
    ///
    /// A lone, empty sequence-1 snapshot without a pointer is a bootstrap
    /// that stopped before the pointer was written; it is completed here.
    fn resolve_current(&self) -> Result<PathBuf, StoreError> {
        self.ensure_dirs()?;

        if !self.pointer_path.exists() {
            return match self.snapshot_files()?.as_slice() {
                [] => self.bootstrap(),
                [(1, first)] if Self::read_snapshot(first).is_ok_and(|s| s.is_empty()) => {
                    self.write_pointer(first)?;
                    info!(snapshot = %first.display(), "Completed interrupted bootstrap");
                    Ok(first.clone())
                }
                _ => Err(StoreError::PointerMissing(self.pointer_path.clone())),
            };
        }

        let content = fs::read_to_string(&self.pointer_path).map_err(|e| {
            StoreError::PointerUnreadable {
                path: self.pointer_path.clone(),
                reason: e.to_string(),
            }
        })?;
        let target = content.trim();
        if target.is_empty() {
            return Err(StoreError::PointerUnreadable {
                path: self.pointer_path.clone(),
                reason: "pointer file is empty".to_string(),
            });
        }

        let target = PathBuf::from(target);
        if !target.is_file() {
            return Err(StoreError::SnapshotMissing(target));
        }
        Ok(target)
    }

    fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::SnapshotCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::SnapshotCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn bootstrap(&self) -> Result<PathBuf, StoreError> {
        let path = self.write_snapshot(1, &Snapshot::default(), Local::now())?;
        self.write_pointer(&path)?;
        info!(snapshot = %path.display(), "Created empty tracking store");
        Ok(path)
    }

    fn write_snapshot(
        &self,
        sequence: u32,
        snapshot: &Snapshot,
        created: DateTime<Local>,
    ) -> Result<PathBuf, StoreError> {
        let path = self
            .snapshot_dir
            .join(Self::snapshot_file_name(sequence, created));

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot
            .serialize(&mut serializer)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = write_temp(&path, &buf)?;
        publish_new(&tmp, &path)?;
        debug!(snapshot = %path.display(), items = snapshot.len(), "Snapshot written");
        Ok(path)
    }

    fn write_pointer(&self, target: &Path) -> Result<(), StoreError> {
        let target = target.to_str().ok_or_else(|| {
            StoreError::Io(format!(
                "Snapshot path is not valid UTF-8: {}",
                target.display()
            ))
        })?;
        let tmp = write_temp(&self.pointer_path, target.as_bytes())?;
        fs::rename(&tmp, &self.pointer_path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io(format!(
                "Failed to replace {}: {}",
                self.pointer_path.display(),
                e
            ))
        })
    }
}

/// Writes `bytes` to a hidden sibling temp file of `path` and syncs it, so
/// the final name only ever appears with complete contents.
fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let write = || -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::Io(format!("Failed to write {}: {}", tmp.display(), e))
    })?;
    Ok(tmp)
}

/// Moves `tmp` to `path` only if `path` does not exist yet. The hard link
/// fails atomically on an existing target, unlike a rename.
fn publish_new(tmp: &Path, path: &Path) -> Result<(), StoreError> {
    let linked = fs::hard_link(tmp, path);
    let _ = fs::remove_file(tmp);
    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(StoreError::SnapshotExists(path.to_path_buf()))
        }
        Err(e) => Err(StoreError::Io(format!(
            "Failed to publish {}: {}",
            path.display(),
            e
        ))),
    }
}

impl TrackingStoreTrait for TrackingStore {
    fn latest_snapshot(&self) -> Result<Snapshot, StoreError> {
        let path = self.resolve_current()?;
        Self::read_snapshot(&path)
    }

    /// An empty `new_items` leaves the store untouched.
    fn append(&self, new_items: &[TrackedItem]) -> Result<PathBuf, StoreError> {
        let current = self.resolve_current()?;
        let mut snapshot = Self::read_snapshot(&current)?;
        if new_items.is_empty() {
            return Ok(current);
        }

        let previous = snapshot.len();
        snapshot.processed.extend_from_slice(new_items);

        let sequence = self.next_sequence()?;
        let path = self.write_snapshot(sequence, &snapshot, Local::now())?;
        self.write_pointer(&path)?;

        info!(
            previous,
            added = new_items.len(),
            total = snapshot.len(),
            snapshot = %path.display(),
            "Tracking store updated"
        );
        Ok(path)
    }

    fn current_snapshot_path(&self) -> Result<PathBuf, StoreError> {
        self.resolve_current()
    }
}
