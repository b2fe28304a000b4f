//! Synchronization of a client session with the store.
//!
//! The update marker is the only thing compared. When it matches what the
//! session last saw, nothing happens; otherwise the session adopts the store's
//! record wholesale. There is no field-level merge.

use super::session::ClientSession;
use crate::record::SharedRecord;

/// Outcome of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The store still holds the record this session last saw.
    Unchanged,
    /// The session adopted a newer (or, after a store reset, older) record.
    Replaced { previous: SharedRecord },
}

impl Reconciled {
    pub fn changed(&self) -> bool {
        matches!(self, Reconciled::Replaced { .. })
    }
}

/// Bring `session` in line with the store's latest record.
///
/// On change the celebration flag is cleared, so a reached state this client
/// has not seen yet is celebrated exactly once.
pub fn reconcile(session: &mut ClientSession, latest: &SharedRecord) -> Reconciled {
    if latest.update_marker == session.last_seen_marker() {
        return Reconciled::Unchanged;
    }

    if latest.update_marker < session.last_seen_marker() {
        // Markers only go backwards when the store was recreated.
        log_warning!(
            "Store marker went backwards ({} -> {}), adopting store state",
            session.last_seen_marker(),
            latest.update_marker
        );
    }

    let previous = *session.cached_record();
    session.replace(*latest);
    session.set_celebrated(false);
    Reconciled::Replaced { previous }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DisplayMode, RecordFields, TimeOfDay, UpdateMarker};

    fn record(marker: u64, hour: u8, reached: bool) -> SharedRecord {
        SharedRecord::new(
            RecordFields {
                target_time: TimeOfDay::new(hour, 0).unwrap(),
                mode: DisplayMode::CountDownTo,
                reached,
                forced_override: reached,
            },
            UpdateMarker(marker),
        )
    }

    #[test]
    fn test_same_marker_is_a_no_op() {
        let mut session = ClientSession::new();
        let latest = record(3, 7, false);
        reconcile(&mut session, &latest);

        let before = session.clone();
        assert_eq!(reconcile(&mut session, &latest), Reconciled::Unchanged);
        assert_eq!(session, before);
    }

    #[test]
    fn test_new_marker_replaces_everything() {
        let mut session = ClientSession::new();
        reconcile(&mut session, &record(1, 7, false));

        let latest = record(2, 19, true);
        let outcome = reconcile(&mut session, &latest);
        assert!(outcome.changed());
        assert_eq!(*session.cached_record(), latest);
        assert_eq!(session.last_seen_marker(), UpdateMarker(2));
    }

    #[test]
    fn test_reconcile_twice_equals_once() {
        let latest = record(5, 12, true);

        let mut once = ClientSession::new();
        reconcile(&mut once, &latest);

        let mut twice = ClientSession::new();
        reconcile(&mut twice, &latest);
        reconcile(&mut twice, &latest);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_change_resets_celebration() {
        let mut session = ClientSession::new();
        reconcile(&mut session, &record(1, 7, true));
        session.set_celebrated(true);

        reconcile(&mut session, &record(1, 7, true));
        assert!(session.celebrated());

        reconcile(&mut session, &record(2, 7, true));
        assert!(!session.celebrated());
    }

    #[test]
    fn test_edit_draft_survives_reconcile() {
        let mut session = ClientSession::new();
        session.begin_edit().target_time = TimeOfDay::new(9, 30).unwrap();
        reconcile(&mut session, &record(4, 18, false));
        assert_eq!(
            session.draft().unwrap().target_time,
            TimeOfDay::new(9, 30).unwrap()
        );
    }
}
