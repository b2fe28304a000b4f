//! Reached-state evaluation.
//!
//! Given the current time and the shared record's fields, decide whether the
//! target has been reached and what duration to show. Everything here is a
//! pure function of its inputs; the caller owns persistence and side effects.
//!
//! ## Rules
//!
//! The natural condition compares time-of-day only (`now.time() >= target`),
//! so the target recurs every day at the same wall-clock instant.
//!
//! | forced override | natural | previous | reached | just reached |
//! |-----------------|---------|----------|---------|--------------|
//! | no              | yes     | no       | yes     | yes          |
//! | no              | yes     | yes      | yes     | no           |
//! | no              | no      | any      | no      | no           |
//! | yes             | any     | p        | p       | no           |
//!
//! ## Durations
//!
//! - Not reached: time until the next occurrence of the target, labelled
//!   "remaining" in both modes.
//! - Reached, count up: time since today's target, labelled "elapsed". If
//!   the flag was forced on before today's target, yesterday's is used.
//! - Reached, count down: nothing.

use chrono::{DateTime, Days, TimeDelta};
use chrono_tz::Tz;
use std::fmt;

use crate::common::utils;
use crate::record::{DisplayMode, TimeOfDay};
use crate::time::source::localize;

/// What the displayed duration measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationLabel {
    Remaining,
    Elapsed,
}

impl DurationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationLabel::Remaining => "remaining",
            DurationLabel::Elapsed => "elapsed",
        }
    }
}

impl fmt::Display for DurationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-negative duration and what it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub duration: TimeDelta,
    pub label: DurationLabel,
}

impl Countdown {
    /// Whole hours, minutes and seconds, fractional seconds truncated.
    pub fn hms(&self) -> (i64, i64, i64) {
        utils::split_hms(self.duration)
    }

    /// `HH:MM:SS`.
    pub fn hms_text(&self) -> String {
        utils::format_hms(self.duration)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.hms_text(), self.label)
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub reached: bool,
    /// The one-shot false-to-true crossing. Triggers the durable write-back.
    pub just_reached: bool,
    pub countdown: Option<Countdown>,
}

/// Whether the wall clock has passed the target today.
pub fn natural_reach(now: &DateTime<Tz>, target: TimeOfDay) -> bool {
    now.time() >= target.to_naive_time()
}

/// Evaluate the reached flag and the duration to display.
pub fn evaluate(
    now: DateTime<Tz>,
    target: TimeOfDay,
    mode: DisplayMode,
    prev_reached: bool,
    forced_override: bool,
) -> Evaluation {
    let natural = natural_reach(&now, target);

    let (reached, just_reached) = if forced_override {
        (prev_reached, false)
    } else {
        (natural, natural && !prev_reached)
    };

    Evaluation {
        reached,
        just_reached,
        countdown: countdown(now, target, mode, reached),
    }
}

fn countdown(
    now: DateTime<Tz>,
    target: TimeOfDay,
    mode: DisplayMode,
    reached: bool,
) -> Option<Countdown> {
    let tz = now.timezone();
    let today = now.date_naive();
    let time = target.to_naive_time();
    let target_today = localize(tz, today, time);

    match (reached, mode) {
        (false, _) => {
            let next = if target_today <= now {
                localize(tz, today + Days::new(1), time)
            } else {
                target_today
            };
            Some(Countdown {
                duration: next - now,
                label: DurationLabel::Remaining,
            })
        }
        (true, DisplayMode::CountUpFrom) => {
            let since = if target_today <= now {
                target_today
            } else {
                localize(tz, today - Days::new(1), time)
            };
            Some(Countdown {
                duration: now - since,
                label: DurationLabel::Elapsed,
            })
        }
        (true, DisplayMode::CountDownTo) => None,
    }
}
