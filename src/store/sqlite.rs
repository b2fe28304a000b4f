//! SQLite store.
//!
//! Records are appended to `beacon_record`; the autoincrement primary key is
//! the update marker, so SQLite itself guarantees markers are never reused or
//! reordered. The latest row is the current record.

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::RecordStore;
use crate::errors::{BeaconError, BeaconResult};
use crate::record::{DisplayMode, RecordFields, SharedRecord, TimeOfDay, UpdateMarker};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS beacon_record (
    marker          INTEGER PRIMARY KEY AUTOINCREMENT,
    target_time     TEXT    NOT NULL,
    mode            TEXT    NOT NULL,
    reached         INTEGER NOT NULL,
    forced_override INTEGER NOT NULL
);
";

const SELECT_LATEST: &str = "
SELECT marker, target_time, mode, reached, forced_override
FROM beacon_record
ORDER BY marker DESC
LIMIT 1
";

// Other clients may hold the write lock briefly.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> BeaconResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                BeaconError::StoreUnavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(unavailable)?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> BeaconResult<Self> {
        Self::from_connection(Connection::open_in_memory().map_err(unavailable)?)
    }

    fn from_connection(conn: Connection) -> BeaconResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        conn.execute_batch(SCHEMA).map_err(unavailable)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn unavailable(e: rusqlite::Error) -> BeaconError {
    BeaconError::StoreUnavailable(e.to_string())
}

fn write_failed(e: rusqlite::Error) -> BeaconError {
    BeaconError::StoreWriteFailed(e.to_string())
}

/// Conversion failures mean a malformed row; everything else is I/O.
fn read_error(e: rusqlite::Error) -> BeaconError {
    match e {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            BeaconError::StoreCorrupt(e.to_string())
        }
        other => unavailable(other),
    }
}

fn conversion_failure(column: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(BeaconError::StoreCorrupt(reason)),
    )
}

fn map_row(row: &Row) -> rusqlite::Result<SharedRecord> {
    let marker: i64 = row.get("marker")?;
    let time_str: String = row.get("target_time")?;
    let mode_str: String = row.get("mode")?;

    let target_time = time_str
        .parse::<TimeOfDay>()
        .map_err(|e| conversion_failure(1, e.to_string()))?;
    let mode = mode_str
        .parse::<DisplayMode>()
        .map_err(|reason| conversion_failure(2, reason))?;

    Ok(SharedRecord::new(
        RecordFields {
            target_time,
            mode,
            reached: row.get("reached")?,
            forced_override: row.get("forced_override")?,
        },
        UpdateMarker(marker.max(0) as u64),
    ))
}

fn insert(conn: &Connection, fields: &RecordFields) -> rusqlite::Result<UpdateMarker> {
    conn.execute(
        "INSERT INTO beacon_record (target_time, mode, reached, forced_override)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            fields.target_time.to_string(),
            fields.mode.as_str(),
            fields.reached,
            fields.forced_override
        ],
    )?;
    Ok(UpdateMarker(conn.last_insert_rowid().max(0) as u64))
}

impl RecordStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn read_latest(&self) -> BeaconResult<Option<SharedRecord>> {
        let conn = self.lock();
        conn.query_row(SELECT_LATEST, [], map_row)
            .optional()
            .map_err(read_error)
    }

    fn write_new(&self, fields: RecordFields) -> BeaconResult<UpdateMarker> {
        let conn = self.lock();
        insert(&conn, &fields).map_err(write_failed)
    }

    fn ensure_initialized(&self) -> BeaconResult<SharedRecord> {
        let mut conn = self.lock();
        // IMMEDIATE takes the write lock up front, so two cold-start clients
        // cannot both see an empty table.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(write_failed)?;

        let existing = tx
            .query_row(SELECT_LATEST, [], map_row)
            .optional()
            .map_err(read_error);

        let record = match existing {
            Ok(Some(record)) => record,
            Ok(None) | Err(BeaconError::StoreCorrupt(_)) => {
                let fields = RecordFields::default();
                let marker = insert(&tx, &fields).map_err(write_failed)?;
                SharedRecord::new(fields, marker)
            }
            Err(e) => return Err(e),
        };

        tx.commit().map_err(write_failed)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_table_reads_as_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.read_latest().unwrap(), None);
    }

    #[test]
    fn test_latest_marker_wins() {
        let store = SqliteStore::open_in_memory().unwrap();
        let w1 = RecordFields {
            target_time: TimeOfDay::new(8, 15).unwrap(),
            ..RecordFields::default()
        };
        let w2 = RecordFields {
            target_time: TimeOfDay::new(21, 0).unwrap(),
            mode: DisplayMode::CountDownTo,
            ..RecordFields::default()
        };
        let m1 = store.write_new(w1).unwrap();
        let m2 = store.write_new(w2).unwrap();
        assert!(m2 > m1);

        let latest = store.read_latest().unwrap().unwrap();
        assert_eq!(latest.fields, w2);
        assert_eq!(latest.update_marker, m2);
    }

    #[test]
    fn test_ensure_initialized_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.ensure_initialized().unwrap();
        let b = store.ensure_initialized().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fields, RecordFields::default());
    }

    #[test]
    fn test_corrupt_row_is_replaced_by_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .lock()
            .execute(
                "INSERT INTO beacon_record (target_time, mode, reached, forced_override)
                 VALUES ('99:99', 'sideways', 0, 0)",
                [],
            )
            .unwrap();

        assert!(matches!(store.read_latest(), Err(BeaconError::StoreCorrupt(_))));
        let restored = store.latest_or_default().unwrap();
        assert_eq!(restored.fields, RecordFields::default());
        assert!(restored.update_marker > UpdateMarker(1));
    }

    #[test]
    fn test_two_connections_share_the_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("beacon.db");
        let a = SqliteStore::open(&path).unwrap();
        let b = SqliteStore::open(&path).unwrap();

        let initial_a = a.ensure_initialized().unwrap();
        let initial_b = b.ensure_initialized().unwrap();
        assert_eq!(initial_a, initial_b);

        let marker = b.write_new(RecordFields::default().with_reached(true, true)).unwrap();
        assert_eq!(a.read_latest().unwrap().unwrap().update_marker, marker);
    }
}
