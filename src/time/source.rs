//! Time source abstraction for real and simulated time.
//!
//! All time-of-day decisions in timebeacon are made in one fixed time zone, so
//! the rest of the crate never talks to a `TimeSource` directly. It goes
//! through [`Clock`], which pairs a source with the configured zone. Clocks
//! are passed explicitly; there is no process-wide time source.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

use crate::common::constants::MINIMUM_SIMULATION_MULTIPLIER;

/// Trait for abstracting time operations.
pub trait TimeSource: Send + Sync {
    /// Get the current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for the specified duration (or simulate it).
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a simulated time source.
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses the system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

#[derive(Debug)]
struct SimulationAnchor {
    simulated: DateTime<Utc>,
    real: Instant,
}

/// Simulated time source for tests and time-accelerated runs.
///
/// Two modes are supported:
/// - Linear acceleration: simulated time flows `multiplier` times faster than
///   real time, and `sleep` blocks for the scaled-down real duration.
/// - Fast-forward (`multiplier == 0.0`): time only moves when something sleeps
///   or calls [`advance`](Self::advance); `sleep` returns almost immediately.
pub struct SimulatedTimeSource {
    multiplier: f64,
    anchor: Mutex<SimulationAnchor>,
}

impl SimulatedTimeSource {
    /// Create a new simulated source starting at `start`.
    ///
    /// Negative or non-finite multipliers fall back to one simulated minute per
    /// real second. Positive multipliers are raised to
    /// [`MINIMUM_SIMULATION_MULTIPLIER`].
    pub fn new(start: DateTime<Utc>, multiplier: f64) -> Self {
        let multiplier = if multiplier < 0.0 || !multiplier.is_finite() {
            60.0
        } else if multiplier > 0.0 {
            multiplier.max(MINIMUM_SIMULATION_MULTIPLIER)
        } else {
            multiplier
        };
        Self {
            multiplier,
            anchor: Mutex::new(SimulationAnchor {
                simulated: start,
                real: Instant::now(),
            }),
        }
    }

    /// Create a fast-forward source, the usual choice in tests.
    pub fn fast_forward(start: DateTime<Utc>) -> Self {
        Self::new(start, 0.0)
    }

    fn is_fast_forward(&self) -> bool {
        self.multiplier == 0.0
    }

    fn current(&self, anchor: &SimulationAnchor) -> DateTime<Utc> {
        if self.is_fast_forward() {
            return anchor.simulated;
        }
        let real_elapsed = anchor.real.elapsed().as_secs_f64();
        let simulated_elapsed = real_elapsed * self.multiplier;
        anchor.simulated + TimeDelta::microseconds((simulated_elapsed * 1_000_000.0) as i64)
    }

    /// Jump to an absolute simulated instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut anchor = self.anchor.lock().unwrap_or_else(|e| e.into_inner());
        anchor.simulated = instant;
        anchor.real = Instant::now();
    }

    /// Move simulated time forward (or backward, for negative deltas).
    pub fn advance(&self, delta: TimeDelta) {
        let mut anchor = self.anchor.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.current(&anchor);
        anchor.simulated = now + delta;
        anchor.real = Instant::now();
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        let anchor = self.anchor.lock().unwrap_or_else(|e| e.into_inner());
        self.current(&anchor)
    }

    fn sleep(&self, duration: StdDuration) {
        if self.is_fast_forward() {
            let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
            self.advance(delta);
            // Let other threads (signal handler, logger) make progress.
            std::thread::sleep(StdDuration::from_millis(1));
        } else {
            let real = duration.as_secs_f64() / self.multiplier;
            if real > 0.0 {
                let real = StdDuration::try_from_secs_f64(real).unwrap_or(StdDuration::MAX);
                std::thread::sleep(real);
            }
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// A time source bound to the beacon's fixed time zone.
#[derive(Clone)]
pub struct Clock {
    source: Arc<dyn TimeSource>,
    tz: Tz,
}

impl Clock {
    pub fn new(source: Arc<dyn TimeSource>, tz: Tz) -> Self {
        Self { source, tz }
    }

    /// Clock backed by the system time.
    pub fn real(tz: Tz) -> Self {
        Self::new(Arc::new(RealTimeSource), tz)
    }

    /// Current wall-clock time in the beacon's zone.
    pub fn now(&self) -> DateTime<Tz> {
        self.source.now().with_timezone(&self.tz)
    }

    pub fn sleep(&self, duration: StdDuration) {
        self.source.sleep(duration);
    }

    pub fn is_simulated(&self) -> bool {
        self.source.is_simulated()
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("tz", &self.tz)
            .field("simulated", &self.is_simulated())
            .finish()
    }
}

/// Combine a calendar date and a time-of-day into an instant in `tz`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
/// Nonexistent local times (DST spring-forward gap) are pushed forward until
/// they exist, which is at most the length of the gap.
pub fn localize(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let mut naive = date.and_time(time);
    loop {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return dt;
        }
        naive += TimeDelta::minutes(1);
    }
}

/// Parse a datetime string `YYYY-MM-DD HH:MM:SS` as local time in `tz`.
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<DateTime<Tz>, String> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    tz.from_local_datetime(&naive)
        .single()
        .ok_or_else(|| format!("Ambiguous or invalid time in timezone {tz}"))
}
