use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;
use timebeacon::core::Beacon;
use timebeacon::record::{DisplayMode, RecordFields, TimeOfDay};
use timebeacon::store::{FileStore, MemoryStore, RecordStore, SqliteStore};
use timebeacon::time::source::{Clock, SimulatedTimeSource, parse_datetime_in_tz};

const TZ: chrono_tz::Tz = chrono_tz::Asia::Tokyo;

// Helper: a fast-forward clock starting at a Tokyo wall-clock time
fn simulated_clock(start: &str) -> (Arc<SimulatedTimeSource>, Clock) {
    let start = parse_datetime_in_tz(start, TZ).unwrap().with_timezone(&Utc);
    let source = Arc::new(SimulatedTimeSource::fast_forward(start));
    (source.clone(), Clock::new(source, TZ))
}

fn tod(h: u8, m: u8) -> TimeOfDay {
    TimeOfDay::new(h, m).unwrap()
}

#[test]
fn test_toggle_then_edit_propagates_to_both_clients() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (_source, clock) = simulated_clock("2025-01-10 12:00:00");

    let mut a = Beacon::connect(store.clone(), clock.clone()).unwrap();
    let mut b = Beacon::connect(store.clone(), clock).unwrap();
    assert!(!a.tick().view.reached);
    assert!(!b.tick().view.reached);

    // A pins the flag while the clock is still before 23:59.
    a.set_forced(true).unwrap();
    let b_view = b.tick();
    assert!(b_view.reconciled.changed());
    assert!(b_view.view.reached);
    assert!(b_view.celebrate);

    // A moves the target into the future: override and flag clear for both.
    a.edit_target(tod(18, 0), DisplayMode::CountDownTo).unwrap();
    for beacon in [&mut a, &mut b] {
        let report = beacon.tick();
        assert!(!report.view.reached);
        assert!(!report.view.record.forced_override());
        assert_eq!(report.view.record.target_time(), tod(18, 0));
        assert_eq!(report.view.countdown_text().as_deref(), Some("06:00:00"));
    }
}

#[test]
fn test_natural_crossing_is_written_once_and_seen_by_others() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (source, clock) = simulated_clock("2025-01-10 23:58:59");

    let mut a = Beacon::connect(store.clone(), clock.clone()).unwrap();
    let mut b = Beacon::connect(store.clone(), clock).unwrap();
    a.tick();
    b.tick();

    source.advance(TimeDelta::seconds(1));
    let a_report = a.tick();
    assert!(a_report.view.reached);
    assert!(a_report.wrote.is_some());

    // B reconciles to A's write and does not write again.
    let b_report = b.tick();
    assert!(b_report.reconciled.changed());
    assert!(b_report.view.reached);
    assert!(b_report.wrote.is_none());
    assert!(b_report.celebrate);
    assert_eq!(b_report.view.countdown_text().as_deref(), Some("00:00:00"));

    let latest = store.read_latest().unwrap().unwrap();
    assert_eq!(Some(latest.update_marker), a_report.wrote);
    assert!(latest.forced_override());
}

#[test]
fn test_manual_off_after_crossing_persists_for_everyone() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (source, clock) = simulated_clock("2025-01-10 23:59:05");

    let mut a = Beacon::connect(store.clone(), clock.clone()).unwrap();
    let mut b = Beacon::connect(store.clone(), clock).unwrap();
    assert!(a.tick().view.reached);
    assert!(b.tick().view.reached);

    b.set_forced(false).unwrap();
    for _ in 0..5 {
        source.advance(TimeDelta::seconds(1));
        assert!(!a.tick().view.reached);
        assert!(!b.tick().view.reached);
    }
}

#[test]
fn test_manual_off_on_moved_target_is_not_undone_by_other_client() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (source, clock) = simulated_clock("2025-01-10 12:00:00");

    let mut a = Beacon::connect(store.clone(), clock.clone()).unwrap();
    let mut b = Beacon::connect(store.clone(), clock).unwrap();
    a.tick();
    b.tick();

    // A moves the target into the past, then switches the flag off.
    a.edit_target(tod(7, 0), DisplayMode::CountUpFrom).unwrap();
    a.set_forced(false).unwrap();

    for _ in 0..3 {
        source.advance(TimeDelta::seconds(1));
        let b_report = b.tick();
        assert!(!b_report.view.reached);
        assert!(b_report.wrote.is_none());
        assert!(!a.tick().view.reached);
    }

    let latest = store.read_latest().unwrap().unwrap();
    assert_eq!(latest.target_time(), tod(7, 0));
    assert!(!latest.reached());
    assert!(latest.forced_override());
}

#[test]
fn test_edit_to_past_time_reaches_for_everyone() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (_source, clock) = simulated_clock("2025-01-10 20:00:00");

    let mut a = Beacon::connect(store.clone(), clock.clone()).unwrap();
    let mut b = Beacon::connect(store.clone(), clock).unwrap();

    a.edit_target_input("1930", DisplayMode::CountUpFrom).unwrap();
    let report = b.tick();
    assert!(report.view.reached);
    assert_eq!(report.view.countdown_text().as_deref(), Some("00:30:00"));
}

#[test]
fn test_cancelled_edit_is_never_written() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (_source, clock) = simulated_clock("2025-01-10 09:00:00");

    let mut a = Beacon::connect(store.clone(), clock).unwrap();
    let before = store.read_latest().unwrap().unwrap();

    a.session_mut().begin_edit().target_time = tod(6, 0);
    a.cancel_edit();
    assert_eq!(a.commit_draft().unwrap(), None);
    assert_eq!(store.read_latest().unwrap().unwrap(), before);
}

#[test]
fn test_last_writer_wins_on_file_store() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("beacon.json");
    let store = Arc::new(FileStore::open(path).unwrap());

    let first = store
        .write_new(RecordFields {
            target_time: tod(7, 0),
            ..RecordFields::default()
        })
        .unwrap();
    let second = store
        .write_new(RecordFields {
            target_time: tod(8, 0),
            mode: DisplayMode::CountDownTo,
            ..RecordFields::default()
        })
        .unwrap();

    assert!(second > first);
    let latest = store.read_latest().unwrap().unwrap();
    assert_eq!(latest.update_marker, second);
    assert_eq!(latest.target_time(), tod(8, 0));
    assert_eq!(latest.mode(), DisplayMode::CountDownTo);
}

#[test]
fn test_concurrent_writers_on_sqlite_store() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("beacon.db");

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let path = path.clone();
            thread::spawn(move || {
                let store = SqliteStore::open(&path).unwrap();
                (0..5u8)
                    .map(|j| {
                        let fields = RecordFields {
                            target_time: tod(i, j),
                            ..RecordFields::default()
                        };
                        (store.write_new(fields).unwrap(), fields)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut writes: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    writes.sort_by_key(|(marker, _)| *marker);
    writes.dedup_by_key(|(marker, _)| *marker);
    assert_eq!(writes.len(), 20, "every write gets a distinct marker");

    let (highest, fields) = writes.last().copied().unwrap();
    let latest = SqliteStore::open(&path).unwrap().read_latest().unwrap().unwrap();
    assert_eq!(latest.update_marker, highest);
    assert_eq!(latest.fields, fields);
}

#[test]
fn test_cold_start_race_converges_on_file_store() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("beacon.json");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || FileStore::open(path).unwrap().ensure_initialized().unwrap())
        })
        .collect();

    let records: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = records[0];
    assert!(records.iter().all(|r| *r == first));
    assert_eq!(first.fields, RecordFields::default());
}

#[test]
fn test_clients_on_different_backends_share_nothing() {
    let (_source, clock) = simulated_clock("2025-01-10 09:00:00");
    let left: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let right: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

    let mut a = Beacon::connect(left, clock.clone()).unwrap();
    let mut b = Beacon::connect(right, clock).unwrap();
    a.edit_target(tod(10, 0), DisplayMode::CountDownTo).unwrap();
    assert_eq!(b.tick().view.record.target_time(), tod(23, 59));
}
