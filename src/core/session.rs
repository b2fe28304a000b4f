//! Per-client session state.
//!
//! A session caches the last record this client has seen, the marker it was
//! seen at, an optional in-progress edit, and two client-local observations:
//! whether the current reached state has been celebrated, and the natural
//! condition at the previous tick together with the target it was measured
//! against.

use crate::record::{DisplayMode, RecordFields, SharedRecord, TimeOfDay, UpdateMarker};

/// A target/mode edit being composed but not yet committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDraft {
    pub target_time: TimeOfDay,
    pub mode: DisplayMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    cached: SharedRecord,
    last_seen_marker: UpdateMarker,
    draft: Option<EditDraft>,
    celebrated: bool,
    last_natural: Option<(TimeOfDay, bool)>,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientSession {
    /// A session that has not reconciled yet. It shows the cold-start defaults
    /// and holds [`UpdateMarker::NONE`], so the first reconciliation always
    /// replaces its state.
    pub fn new() -> Self {
        Self {
            cached: SharedRecord::new(RecordFields::default(), UpdateMarker::NONE),
            last_seen_marker: UpdateMarker::NONE,
            draft: None,
            celebrated: false,
            last_natural: None,
        }
    }

    pub fn cached_record(&self) -> &SharedRecord {
        &self.cached
    }

    pub fn last_seen_marker(&self) -> UpdateMarker {
        self.last_seen_marker
    }

    // # Reconciliation

    /// Replace the cached record wholesale.
    pub(crate) fn replace(&mut self, latest: SharedRecord) {
        self.cached = latest;
        self.last_seen_marker = latest.update_marker;
    }

    /// Adopt a record this client has just written.
    pub(crate) fn apply_commit(&mut self, written: SharedRecord) {
        self.replace(written);
    }

    // # Editing

    pub fn editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    /// Start composing an edit, seeded from the cached record. An edit that
    /// is already in progress is kept.
    pub fn begin_edit(&mut self) -> &mut EditDraft {
        let cached = self.cached.fields;
        self.draft.get_or_insert(EditDraft {
            target_time: cached.target_time,
            mode: cached.mode,
        })
    }

    /// Discard the draft. Nothing is written.
    pub fn cancel_edit(&mut self) -> Option<EditDraft> {
        self.draft.take()
    }

    // # Client-local observations

    pub fn celebrated(&self) -> bool {
        self.celebrated
    }

    pub(crate) fn set_celebrated(&mut self, celebrated: bool) {
        self.celebrated = celebrated;
    }

    /// Whether the clock moved `target` across its natural condition since
    /// the previous tick. The first observation is never an edge, and neither
    /// is a change of target.
    pub(crate) fn natural_edge(&self, target: TimeOfDay, natural: bool) -> bool {
        self.last_natural
            .is_some_and(|(last_target, last)| last_target == target && last != natural)
    }

    pub(crate) fn record_natural(&mut self, target: TimeOfDay, natural: bool) {
        self.last_natural = Some((target, natural));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_holds_defaults() {
        let session = ClientSession::new();
        assert_eq!(session.cached_record().fields, RecordFields::default());
        assert_eq!(session.last_seen_marker(), UpdateMarker::NONE);
        assert!(!session.editing());
    }

    #[test]
    fn test_edit_then_cancel_leaves_record_alone() {
        let mut session = ClientSession::new();
        let draft = session.begin_edit();
        draft.target_time = TimeOfDay::new(6, 45).unwrap();
        draft.mode = DisplayMode::CountDownTo;
        assert!(session.editing());

        let discarded = session.cancel_edit().unwrap();
        assert_eq!(discarded.target_time, TimeOfDay::new(6, 45).unwrap());
        assert!(!session.editing());
        assert_eq!(session.cached_record().fields, RecordFields::default());
    }

    #[test]
    fn test_natural_edges() {
        let target = TimeOfDay::new(23, 59).unwrap();
        let mut session = ClientSession::new();
        assert!(!session.natural_edge(target, true));
        session.record_natural(target, false);
        assert!(!session.natural_edge(target, false));
        assert!(session.natural_edge(target, true));
    }

    #[test]
    fn test_new_target_is_not_an_edge() {
        let mut session = ClientSession::new();
        session.record_natural(TimeOfDay::new(23, 59).unwrap(), false);
        assert!(!session.natural_edge(TimeOfDay::new(7, 0).unwrap(), true));
    }
}
