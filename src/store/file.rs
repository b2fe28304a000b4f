//! JSON file store.
//!
//! The record lives in a single pretty-printed JSON document. Every access
//! takes an `fs2` advisory lock on a sibling `.lock` file (shared for reads,
//! exclusive for writes), and writes go through a temporary file in the same
//! directory that is atomically renamed over the document, so readers never
//! observe a half-written record.
//!
//! Markers are `max(previous + 1, now in microseconds)`. Mixing in wall time
//! keeps them increasing even when a corrupt document had to be replaced and
//! its previous marker could not be recovered.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

use super::RecordStore;
use crate::errors::{BeaconError, BeaconResult};
use crate::record::{RecordFields, SharedRecord, UpdateMarker};

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Use `path` as the record document, creating its directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> BeaconResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                BeaconError::StoreUnavailable(format!(
                    "cannot create {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let lock_path = path.with_extension("lock");
        Ok(Self { path, lock_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock_file(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
    }

    fn lock_shared(&self) -> BeaconResult<File> {
        let file = self
            .open_lock_file()
            .map_err(|e| BeaconError::StoreUnavailable(format!("lock file: {e}")))?;
        file.lock_shared()
            .map_err(|e| BeaconError::StoreUnavailable(format!("shared lock: {e}")))?;
        Ok(file)
    }

    fn lock_exclusive(&self) -> BeaconResult<File> {
        let file = self
            .open_lock_file()
            .map_err(|e| BeaconError::StoreWriteFailed(format!("lock file: {e}")))?;
        file.lock_exclusive()
            .map_err(|e| BeaconError::StoreWriteFailed(format!("exclusive lock: {e}")))?;
        Ok(file)
    }

    /// Read the document without locking. Callers hold the lock.
    fn read_unlocked(&self) -> BeaconResult<Option<SharedRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BeaconError::StoreUnavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BeaconError::StoreCorrupt(e.to_string()))
    }

    /// Highest marker recorded in the document, even if the rest is corrupt.
    fn previous_marker(&self) -> u64 {
        match self.read_unlocked() {
            Ok(Some(record)) => record.update_marker.value(),
            Ok(None) => 0,
            Err(_) => fs::read_to_string(&self.path)
                .ok()
                .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
                .and_then(|value| value.get("update_marker")?.as_u64())
                .unwrap_or(0),
        }
    }

    /// Write a new record. Callers hold the exclusive lock.
    fn append_unlocked(&self, fields: RecordFields) -> BeaconResult<SharedRecord> {
        let now_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        let marker = UpdateMarker(self.previous_marker().saturating_add(1).max(now_micros));
        let record = SharedRecord::new(fields, marker);

        let write_failed = |e: &dyn std::fmt::Display| {
            BeaconError::StoreWriteFailed(format!("{}: {e}", self.path.display()))
        };
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_failed(&e))?;
        serde_json::to_writer_pretty(&mut tmp, &record).map_err(|e| write_failed(&e))?;
        tmp.write_all(b"\n").map_err(|e| write_failed(&e))?;
        tmp.as_file().sync_all().map_err(|e| write_failed(&e))?;
        tmp.persist(&self.path).map_err(|e| write_failed(&e.error))?;

        Ok(record)
    }
}

impl RecordStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    fn read_latest(&self) -> BeaconResult<Option<SharedRecord>> {
        let lock = self.lock_shared()?;
        let result = self.read_unlocked();
        let _ = lock.unlock();
        result
    }

    fn write_new(&self, fields: RecordFields) -> BeaconResult<UpdateMarker> {
        let lock = self.lock_exclusive()?;
        let result = self.append_unlocked(fields);
        let _ = lock.unlock();
        result.map(|record| record.update_marker)
    }

    fn ensure_initialized(&self) -> BeaconResult<SharedRecord> {
        let lock = self.lock_exclusive()?;
        let result = match self.read_unlocked() {
            Ok(Some(record)) => Ok(record),
            Ok(None) | Err(BeaconError::StoreCorrupt(_)) => {
                self.append_unlocked(RecordFields::default())
            }
            Err(e) => Err(e),
        };
        let _ = lock.unlock();
        result
    }
}
