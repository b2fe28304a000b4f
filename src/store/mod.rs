//! Shared record storage.
//!
//! The store is the only shared mutable resource in timebeacon. Clients never
//! patch a record; they read the latest one and write complete replacements,
//! each of which receives an [`UpdateMarker`] strictly greater than every
//! marker written before it. Concurrent writers race and the highest marker
//! wins.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: in-process, shared between clones. Useful for tests and
//!   for several clients inside one process.
//! - [`FileStore`]: one JSON document guarded by an advisory lock file.
//! - [`SqliteStore`]: append-only SQLite table keyed by an autoincrement id.
//!
//! All backends materialize the default record atomically on cold start, and
//! treat a corrupt record as missing.

pub mod file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use crate::common::utils;
use crate::config::{Config, StoreKind};
use crate::errors::{BeaconError, BeaconResult};
use crate::record::{RecordFields, SharedRecord, UpdateMarker};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Read-latest / write-new access to the single shared record.
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore: Send + Sync {
    /// Short name for log output ("memory", "file", "sqlite").
    fn backend_name(&self) -> &'static str;

    /// Return the record with the highest marker.
    ///
    /// `Ok(None)` when nothing has been written yet. A malformed record is
    /// reported as [`BeaconError::StoreCorrupt`].
    fn read_latest(&self) -> BeaconResult<Option<SharedRecord>>;

    /// Persist `fields` as a new record and return its marker.
    fn write_new(&self, fields: RecordFields) -> BeaconResult<UpdateMarker>;

    /// Atomically write the default record unless a valid one exists, and
    /// return whichever record is current afterwards.
    ///
    /// Racing cold-start callers must all end up with the same record.
    fn ensure_initialized(&self) -> BeaconResult<SharedRecord>;

    /// Read the latest record, materializing defaults when it is missing or
    /// corrupt.
    fn latest_or_default(&self) -> BeaconResult<SharedRecord> {
        match self.read_latest() {
            Ok(Some(record)) => Ok(record),
            Ok(None) => self.ensure_initialized(),
            Err(BeaconError::StoreCorrupt(reason)) => {
                log_warning!("Shared record is corrupt ({reason}), restoring defaults");
                self.ensure_initialized()
            }
            Err(e) => Err(e),
        }
    }
}

/// Open the backend selected in the configuration.
pub fn open(config: &Config) -> BeaconResult<Arc<dyn RecordStore>> {
    let kind = config.store_kind();
    let store: Arc<dyn RecordStore> = match kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => {
            let path = config.store_path(kind);
            log_decorated!("Using file store at {}", utils::private_path(&path));
            Arc::new(FileStore::open(path)?)
        }
        StoreKind::Sqlite => {
            let path = config.store_path(kind);
            log_decorated!("Using SQLite store at {}", utils::private_path(&path));
            Arc::new(SqliteStore::open(&path)?)
        }
    };
    Ok(store)
}
