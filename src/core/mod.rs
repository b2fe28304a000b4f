//! Core client logic.
//!
//! A [`Beacon`] is one client of the shared record. Each call to
//! [`Beacon::tick`] runs a full refresh cycle:
//!
//! 1. Pull the latest record from the store and reconcile the session with it.
//! 2. Evaluate the reached state against the client's clock.
//! 3. Write back when this client observes the target being reached, or when a
//!    natural edge releases a forced override that disagrees with the clock.
//! 4. Report a [`BeaconView`] for presentation, plus a one-shot celebration
//!    flag.
//!
//! [`RefreshLoop`] drives ticks on a fixed cadence until its
//! [`CancellationToken`] is cancelled.

pub mod edit;
pub mod evaluator;
pub mod reconcile;
pub mod refresh;
pub mod session;

use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::Arc;

use crate::errors::{BeaconError, BeaconResult};
use crate::record::{DisplayMode, SharedRecord, TimeOfDay, UpdateMarker};
use crate::store::RecordStore;
use crate::time::source::Clock;

use evaluator::{Countdown, Evaluation, evaluate, natural_reach};
use reconcile::{Reconciled, reconcile};
use session::ClientSession;

pub use refresh::{CancellationToken, Presenter, RefreshLoop};

/// Everything a presenter needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconView {
    pub now: DateTime<Tz>,
    pub record: SharedRecord,
    pub reached: bool,
    pub countdown: Option<Countdown>,
    pub editing: bool,
}

impl BeaconView {
    /// Current wall-clock time as `HH:MM:SS`.
    pub fn clock_text(&self) -> String {
        self.now.format("%H:%M:%S").to_string()
    }

    pub fn date_text(&self) -> String {
        self.now.format("%Y-%m-%d").to_string()
    }

    /// The countdown as `HH:MM:SS`, if there is one to show.
    pub fn countdown_text(&self) -> Option<String> {
        self.countdown.map(|c| c.hms_text())
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let record = &self.record;
        let state = if self.reached {
            "reached"
        } else {
            "waiting"
        };
        let mut line = format!(
            "{} {} target {} ({}), {state}",
            self.date_text(),
            self.clock_text(),
            record.target_time(),
            record.mode().display_name(),
        );
        if let Some(countdown) = self.countdown {
            line.push_str(&format!(", {countdown}"));
        }
        if record.forced_override() {
            line.push_str(", pinned");
        }
        line
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub view: BeaconView,
    /// True on the first reached tick this client has not celebrated yet.
    pub celebrate: bool,
    pub reconciled: Reconciled,
    /// Marker of a write-back performed during the tick.
    pub wrote: Option<UpdateMarker>,
    /// A store failure. The view then shows the last known good state.
    pub error: Option<BeaconError>,
}

/// One client of the shared record.
pub struct Beacon {
    store: Arc<dyn RecordStore>,
    clock: Clock,
    session: ClientSession,
    debug_enabled: bool,
}

impl Beacon {
    /// Create a client that has not talked to the store yet.
    pub fn new(store: Arc<dyn RecordStore>, clock: Clock) -> Self {
        Self {
            store,
            clock,
            session: ClientSession::new(),
            debug_enabled: false,
        }
    }

    /// Create a client and reconcile it with the store once, materializing the
    /// default record if the store is empty.
    pub fn connect(store: Arc<dyn RecordStore>, clock: Clock) -> BeaconResult<Self> {
        let mut beacon = Self::new(store, clock);
        let latest = beacon.store.ensure_initialized()?;
        reconcile(&mut beacon.session, &latest);
        Ok(beacon)
    }

    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ClientSession {
        &mut self.session
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Run one refresh cycle.
    pub fn tick(&mut self) -> TickReport {
        let mut error = None;

        let reconciled = match self.store.latest_or_default() {
            Ok(latest) => reconcile(&mut self.session, &latest),
            Err(e) => {
                error = Some(e);
                Reconciled::Unchanged
            }
        };

        if self.debug_enabled
            && let Reconciled::Replaced { previous } = &reconciled
        {
            log_debug!(
                "Adopted record {} (was {})",
                self.session.last_seen_marker(),
                previous.update_marker
            );
        }

        let now = self.clock.now();
        let record = *self.session.cached_record();
        let natural = natural_reach(&now, record.target_time());
        // A natural edge releases an override that disagrees with the clock.
        let override_cleared = record.forced_override()
            && record.reached() != natural
            && self.session.natural_edge(record.target_time(), natural);

        let evaluation = evaluate(
            now,
            record.target_time(),
            record.mode(),
            record.reached(),
            record.forced_override() && !override_cleared,
        );

        let write_back = if evaluation.just_reached {
            Some(record.fields.with_reached(true, true))
        } else if override_cleared {
            Some(record.fields.with_reached(evaluation.reached, false))
        } else {
            None
        };

        let mut wrote = None;
        match write_back {
            Some(fields) => match edit::write(self.store.as_ref(), &mut self.session, fields) {
                Ok(marker) => {
                    if self.debug_enabled {
                        log_debug!("Wrote reached={} as {marker}", fields.reached);
                    }
                    wrote = Some(marker);
                    self.session.record_natural(record.target_time(), natural);
                }
                // Leave the edge unrecorded so the next tick retries the write.
                Err(e) => error = Some(e),
            },
            None => self.session.record_natural(record.target_time(), natural),
        }

        let celebrate = evaluation.reached && !self.session.celebrated();
        self.session.set_celebrated(evaluation.reached);

        TickReport {
            view: self.view_from(now, &evaluation),
            celebrate,
            reconciled,
            wrote,
            error,
        }
    }

    /// Evaluate the cached state without touching the store.
    pub fn view(&self) -> BeaconView {
        let now = self.clock.now();
        let record = self.session.cached_record();
        let evaluation = evaluate(
            now,
            record.target_time(),
            record.mode(),
            record.reached(),
            record.forced_override(),
        );
        self.view_from(now, &evaluation)
    }

    fn view_from(&self, now: DateTime<Tz>, evaluation: &Evaluation) -> BeaconView {
        BeaconView {
            now,
            record: *self.session.cached_record(),
            reached: evaluation.reached,
            countdown: evaluation.countdown,
            editing: self.session.editing(),
        }
    }

    // # User intents

    /// Commit a new target and mode.
    pub fn edit_target(
        &mut self,
        target_time: TimeOfDay,
        mode: DisplayMode,
    ) -> BeaconResult<UpdateMarker> {
        let now = self.clock.now();
        edit::commit_edit(self.store.as_ref(), &mut self.session, &now, target_time, mode)
    }

    /// Commit a target typed as free-form text.
    pub fn edit_target_input(&mut self, input: &str, mode: DisplayMode) -> BeaconResult<UpdateMarker> {
        let now = self.clock.now();
        edit::commit_edit_input(self.store.as_ref(), &mut self.session, &now, input, mode)
    }

    /// Commit the in-progress draft, if any.
    pub fn commit_draft(&mut self) -> BeaconResult<Option<UpdateMarker>> {
        let now = self.clock.now();
        edit::commit_draft(self.store.as_ref(), &mut self.session, &now)
    }

    /// Discard the in-progress draft.
    pub fn cancel_edit(&mut self) {
        self.session.cancel_edit();
    }

    /// Pin the reached flag to `reached`.
    pub fn set_forced(&mut self, reached: bool) -> BeaconResult<UpdateMarker> {
        edit::commit_forced_toggle(self.store.as_ref(), &mut self.session, reached)
    }

    /// Flip the reached flag as currently displayed, and pin it.
    pub fn toggle_forced(&mut self) -> BeaconResult<UpdateMarker> {
        let reached = self.view().reached;
        self.set_forced(!reached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordFields;
    use crate::store::{MemoryStore, MockRecordStore};
    use crate::time::source::{SimulatedTimeSource, parse_datetime_in_tz};
    use chrono::{TimeDelta, Utc};

    fn simulated(start: &str) -> (Arc<SimulatedTimeSource>, Clock) {
        let tz = chrono_tz::Asia::Tokyo;
        let start = parse_datetime_in_tz(start, tz).unwrap().with_timezone(&Utc);
        let source = Arc::new(SimulatedTimeSource::fast_forward(start));
        let clock = Clock::new(source.clone(), tz);
        (source, clock)
    }

    #[test]
    fn test_crossing_writes_back_once_and_celebrates_once() {
        let store = Arc::new(MemoryStore::new());
        let (source, clock) = simulated("2025-01-10 23:58:59");
        let mut beacon = Beacon::connect(store.clone(), clock).unwrap();

        let first = beacon.tick();
        assert!(!first.view.reached);
        assert_eq!(first.view.countdown_text().as_deref(), Some("00:00:01"));
        assert!(first.wrote.is_none());
        assert!(!first.celebrate);

        source.advance(TimeDelta::seconds(1));
        let second = beacon.tick();
        assert!(second.view.reached);
        assert!(second.celebrate);
        assert_eq!(second.view.countdown_text().as_deref(), Some("00:00:00"));
        let marker = second.wrote.unwrap();

        let latest = store.read_latest().unwrap().unwrap();
        assert_eq!(latest.update_marker, marker);
        assert!(latest.reached());
        assert!(latest.forced_override());

        source.advance(TimeDelta::seconds(1));
        let third = beacon.tick();
        assert!(third.view.reached);
        assert!(!third.celebrate);
        assert!(third.wrote.is_none());
        assert!(!third.reconciled.changed());
    }

    #[test]
    fn test_rollover_clears_automatic_override() {
        let store = Arc::new(MemoryStore::new());
        let (source, clock) = simulated("2025-01-10 23:59:30");
        let mut beacon = Beacon::connect(store.clone(), clock).unwrap();

        let reached = beacon.tick();
        assert!(reached.view.reached);
        assert!(store.read_latest().unwrap().unwrap().forced_override());

        source.advance(TimeDelta::seconds(31));
        let next_day = beacon.tick();
        assert!(!next_day.view.reached);
        assert!(next_day.wrote.is_some());

        let latest = store.read_latest().unwrap().unwrap();
        assert!(!latest.reached());
        assert!(!latest.forced_override());
    }

    #[test]
    fn test_manual_off_survives_until_rollover() {
        let store = Arc::new(MemoryStore::new());
        let (source, clock) = simulated("2025-01-10 23:59:10");
        let mut beacon = Beacon::connect(store.clone(), clock).unwrap();

        beacon.tick();
        beacon.set_forced(false).unwrap();

        source.advance(TimeDelta::seconds(5));
        let report = beacon.tick();
        assert!(!report.view.reached);
        assert!(report.wrote.is_none());
    }

    #[test]
    fn test_crossing_releases_manual_off() {
        let store = Arc::new(MemoryStore::new());
        let (source, clock) = simulated("2025-01-10 23:58:58");
        let mut beacon = Beacon::connect(store.clone(), clock).unwrap();

        beacon.tick();
        beacon.set_forced(false).unwrap();

        source.advance(TimeDelta::seconds(2));
        let report = beacon.tick();
        assert!(report.view.reached);
        assert!(report.celebrate);
        assert!(report.wrote.is_some());

        let latest = store.read_latest().unwrap().unwrap();
        assert!(latest.reached());
        assert!(latest.forced_override());
    }

    #[test]
    fn test_manual_off_survives_move_to_past_target() {
        let store = Arc::new(MemoryStore::new());
        let (source, clock) = simulated("2025-01-10 12:00:00");
        let mut beacon = Beacon::connect(store.clone(), clock).unwrap();

        beacon.tick();
        beacon.edit_target(TimeOfDay::new(7, 0).unwrap(), DisplayMode::CountUpFrom).unwrap();
        beacon.set_forced(false).unwrap();

        source.advance(TimeDelta::seconds(1));
        let report = beacon.tick();
        assert!(!report.view.reached);
        assert!(report.wrote.is_none());

        let latest = store.read_latest().unwrap().unwrap();
        assert!(!latest.reached());
        assert!(latest.forced_override());
    }

    #[test]
    fn test_store_down_at_startup_recovers() {
        let mut store = MockRecordStore::new();
        let mut reads = 0;
        store.expect_latest_or_default().times(2).returning(move || {
            reads += 1;
            if reads == 1 {
                Err(BeaconError::StoreUnavailable("offline".into()))
            } else {
                Ok(SharedRecord::new(RecordFields::default(), UpdateMarker(7)))
            }
        });

        let (source, clock) = simulated("2025-01-10 12:00:00");
        let mut beacon = Beacon::new(Arc::new(store), clock);

        let down = beacon.tick();
        assert!(matches!(down.error, Some(BeaconError::StoreUnavailable(_))));
        assert_eq!(down.view.record.update_marker, UpdateMarker::NONE);

        source.advance(TimeDelta::seconds(1));
        let up = beacon.tick();
        assert!(up.error.is_none());
        assert!(up.reconciled.changed());
        assert_eq!(up.view.record.update_marker, UpdateMarker(7));
    }

    #[test]
    fn test_read_failure_keeps_last_known_state() {
        let mut store = MockRecordStore::new();
        store.expect_ensure_initialized().returning(|| {
            Ok(SharedRecord::new(RecordFields::default(), UpdateMarker(4)))
        });
        store
            .expect_latest_or_default()
            .returning(|| Err(BeaconError::StoreUnavailable("offline".into())));

        let (_source, clock) = simulated("2025-01-10 12:00:00");
        let mut beacon = Beacon::connect(Arc::new(store), clock).unwrap();
        let report = beacon.tick();

        assert!(matches!(report.error, Some(BeaconError::StoreUnavailable(_))));
        assert_eq!(report.view.record.update_marker, UpdateMarker(4));
        assert!(!report.view.reached);
    }

    #[test]
    fn test_failed_write_back_is_retried() {
        let mut store = MockRecordStore::new();
        let record = SharedRecord::new(RecordFields::default(), UpdateMarker(1));
        store.expect_ensure_initialized().returning(move || Ok(record));
        store.expect_latest_or_default().returning(move || Ok(record));
        let mut attempts = 0;
        store.expect_write_new().times(2).returning(move |_| {
            attempts += 1;
            if attempts == 1 {
                Err(BeaconError::StoreWriteFailed("busy".into()))
            } else {
                Ok(UpdateMarker(2))
            }
        });

        let (source, clock) = simulated("2025-01-10 23:59:00");
        let mut beacon = Beacon::connect(Arc::new(store), clock).unwrap();

        let failed = beacon.tick();
        assert!(failed.view.reached);
        assert!(failed.celebrate);
        assert!(matches!(failed.error, Some(BeaconError::StoreWriteFailed(_))));

        source.advance(TimeDelta::seconds(1));
        let retried = beacon.tick();
        assert_eq!(retried.wrote, Some(UpdateMarker(2)));
        assert!(!retried.celebrate);
    }

    #[test]
    fn test_toggle_flips_displayed_state() {
        let store = Arc::new(MemoryStore::new());
        let (_source, clock) = simulated("2025-01-10 09:00:00");
        let mut beacon = Beacon::connect(store.clone(), clock).unwrap();

        beacon.toggle_forced().unwrap();
        assert!(beacon.view().reached);
        beacon.toggle_forced().unwrap();
        assert!(!beacon.view().reached);
        assert!(store.read_latest().unwrap().unwrap().forced_override());
    }

    #[test]
    fn test_view_summary() {
        let store = Arc::new(MemoryStore::new());
        let (_source, clock) = simulated("2025-01-10 23:00:00");
        let beacon = Beacon::connect(store, clock).unwrap();
        assert_eq!(
            beacon.view().summary(),
            "2025-01-10 23:00:00 target 23:59 (count up from), waiting, 00:59:00 remaining"
        );
    }
}
