//! In-process store. Clones share the same record.

use std::sync::{Arc, Mutex, MutexGuard};

use super::RecordStore;
use crate::errors::BeaconResult;
use crate::record::{RecordFields, SharedRecord, UpdateMarker};

#[derive(Debug, Default)]
struct MemoryState {
    latest: Option<SharedRecord>,
    last_marker: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicked writer cannot leave a torn record behind: the record is
        // replaced in a single assignment.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn append(state: &mut MemoryState, fields: RecordFields) -> SharedRecord {
    state.last_marker += 1;
    let record = SharedRecord::new(fields, UpdateMarker(state.last_marker));
    state.latest = Some(record);
    record
}

impl RecordStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn read_latest(&self) -> BeaconResult<Option<SharedRecord>> {
        Ok(self.lock().latest)
    }

    fn write_new(&self, fields: RecordFields) -> BeaconResult<UpdateMarker> {
        let mut state = self.lock();
        Ok(append(&mut state, fields).update_marker)
    }

    fn ensure_initialized(&self) -> BeaconResult<SharedRecord> {
        let mut state = self.lock();
        match state.latest {
            Some(record) => Ok(record),
            None => Ok(append(&mut state, RecordFields::default())),
        }
    }
}
