//! Writes to the shared record.
//!
//! Every write goes through here: user edits of the target and mode, manual
//! toggles of the reached flag, and the automatic write-back when a client
//! observes the target being reached. Each write produces a complete record
//! with a fresh marker. The session adopts the written record only after the
//! store confirms it, so a failed write leaves the session as it was and the
//! caller may simply retry.

use chrono::DateTime;
use chrono_tz::Tz;

use super::evaluator::natural_reach;
use super::session::ClientSession;
use crate::errors::BeaconResult;
use crate::record::{DisplayMode, RecordFields, SharedRecord, TimeOfDay, UpdateMarker};
use crate::store::RecordStore;
use crate::time::parse::parse_freeform_time;

/// Fields for a committed edit.
///
/// An edit to a time that has already passed today counts as reached at
/// once, with the override set so the flag holds until midnight.
pub fn edit_fields(now: &DateTime<Tz>, target_time: TimeOfDay, mode: DisplayMode) -> RecordFields {
    let past = natural_reach(now, target_time);
    RecordFields {
        target_time,
        mode,
        reached: past,
        forced_override: past,
    }
}

/// Commit a new target and mode.
pub fn commit_edit(
    store: &dyn RecordStore,
    session: &mut ClientSession,
    now: &DateTime<Tz>,
    target_time: TimeOfDay,
    mode: DisplayMode,
) -> BeaconResult<UpdateMarker> {
    let fields = edit_fields(now, target_time, mode);
    let marker = write(store, session, fields)?;
    session.cancel_edit();
    Ok(marker)
}

/// Commit a target typed as free-form text ("7", "0730", "19:30").
pub fn commit_edit_input(
    store: &dyn RecordStore,
    session: &mut ClientSession,
    now: &DateTime<Tz>,
    input: &str,
    mode: DisplayMode,
) -> BeaconResult<UpdateMarker> {
    let target_time = parse_freeform_time(input)?;
    commit_edit(store, session, now, target_time, mode)
}

/// Commit the session's draft, if any.
pub fn commit_draft(
    store: &dyn RecordStore,
    session: &mut ClientSession,
    now: &DateTime<Tz>,
) -> BeaconResult<Option<UpdateMarker>> {
    let Some(draft) = session.draft().copied() else {
        return Ok(None);
    };
    commit_edit(store, session, now, draft.target_time, draft.mode).map(Some)
}

/// Set the reached flag by hand and pin it with the override.
///
/// The target and mode are taken from the store's latest record rather than
/// the session cache, so a toggle never reverts another client's edit that
/// this client has not reconciled yet.
pub fn commit_forced_toggle(
    store: &dyn RecordStore,
    session: &mut ClientSession,
    reached: bool,
) -> BeaconResult<UpdateMarker> {
    let latest = store.latest_or_default()?;
    write(store, session, latest.fields.with_reached(reached, true))
}

/// Write `fields` and adopt the result on success.
pub(crate) fn write(
    store: &dyn RecordStore,
    session: &mut ClientSession,
    fields: RecordFields,
) -> BeaconResult<UpdateMarker> {
    let marker = store.write_new(fields)?;
    session.apply_commit(SharedRecord::new(fields, marker));
    Ok(marker)
}
