//! The shared record and the values it is made of.
//!
//! A [`SharedRecord`] is never edited in place. Every change is a new write
//! carrying a fresh [`UpdateMarker`], and readers always take the record with
//! the highest marker.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::constants::{DEFAULT_TARGET_HOUR, DEFAULT_TARGET_MINUTE};
use crate::errors::BeaconError;

/// A wall-clock time of day with minute resolution and no date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build a time of day, rejecting hours above 23 and minutes above 59.
    pub fn new(hour: u8, minute: u8) -> Result<Self, BeaconError> {
        if hour > 23 || minute > 59 {
            return Err(BeaconError::InvalidTimeFormat(format!(
                "{hour:02}:{minute:02} is not a valid time of day"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Range checked in `new`.
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self {
            hour: DEFAULT_TARGET_HOUR,
            minute: DEFAULT_TARGET_MINUTE,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Strict `HH:MM` form, as persisted. Free-form input goes through
/// [`crate::time::parse::parse_freeform_time`] instead.
impl FromStr for TimeOfDay {
    type Err = BeaconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BeaconError::InvalidTimeFormat(format!("expected HH:MM, got '{s}'"));
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = BeaconError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// How the duration around the target is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Something starts at the target; once reached, show elapsed time.
    #[default]
    CountUpFrom,
    /// Something ends at the target; once reached, there is nothing to count.
    CountDownTo,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::CountUpFrom => "count_up_from",
            DisplayMode::CountDownTo => "count_down_to",
        }
    }

    /// Human label used after the target time, e.g. "23:59 (count up from)".
    pub fn display_name(&self) -> &'static str {
        match self {
            DisplayMode::CountUpFrom => "count up from",
            DisplayMode::CountDownTo => "count down to",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count_up_from" | "up" => Ok(DisplayMode::CountUpFrom),
            "count_down_to" | "down" => Ok(DisplayMode::CountDownTo),
            other => Err(format!(
                "unknown display mode '{other}' (expected 'up' or 'down')"
            )),
        }
    }
}

/// Strictly increasing write sequence number assigned by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UpdateMarker(pub u64);

impl UpdateMarker {
    /// The marker a session holds before it has seen any record.
    pub const NONE: UpdateMarker = UpdateMarker(0);

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UpdateMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The writable part of a record: everything except the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub target_time: TimeOfDay,
    pub mode: DisplayMode,
    pub reached: bool,
    pub forced_override: bool,
}

impl Default for RecordFields {
    /// Cold-start defaults: 23:59, count up, not reached, no override.
    fn default() -> Self {
        Self {
            target_time: TimeOfDay::default(),
            mode: DisplayMode::CountUpFrom,
            reached: false,
            forced_override: false,
        }
    }
}

impl RecordFields {
    /// Same target and mode, with the reached flag pinned.
    pub fn with_reached(self, reached: bool, forced_override: bool) -> Self {
        Self {
            reached,
            forced_override,
            ..self
        }
    }
}

/// A persisted record as read back from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedRecord {
    #[serde(flatten)]
    pub fields: RecordFields,
    pub update_marker: UpdateMarker,
}

impl SharedRecord {
    pub fn new(fields: RecordFields, update_marker: UpdateMarker) -> Self {
        Self {
            fields,
            update_marker,
        }
    }

    pub fn target_time(&self) -> TimeOfDay {
        self.fields.target_time
    }

    pub fn mode(&self) -> DisplayMode {
        self.fields.mode
    }

    pub fn reached(&self) -> bool {
        self.fields.reached
    }

    pub fn forced_override(&self) -> bool {
        self.fields.forced_override
    }
}
