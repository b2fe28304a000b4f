//! Free-form time-of-day input.
//!
//! Accepts the shapes people actually type into a "target time" box:
//!
//! | input    | result |
//! |----------|--------|
//! | `7`      | 07:00  |
//! | `07`     | 07:00  |
//! | `700`    | 07:00  |
//! | `0700`   | 07:00  |
//! | `7:00`   | 07:00  |
//! | `19:30`  | 19:30  |
//!
//! Out-of-range hours or minutes (`25:00`, `999`) are rejected.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::BeaconError;
use crate::record::TimeOfDay;

static COLON_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid regex"));
static DIGITS_FORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,4}$").expect("valid regex"));

/// Parse user input into a validated [`TimeOfDay`].
pub fn parse_freeform_time(input: &str) -> Result<TimeOfDay, BeaconError> {
    let trimmed = input.trim();
    let invalid = || {
        BeaconError::InvalidTimeFormat(format!(
            "'{trimmed}' is not a time (try 7, 0700, 7:00 or 19:30)"
        ))
    };

    let (hour, minute) = if let Some(caps) = COLON_FORM.captures(trimmed) {
        let group = |i| caps.get(i).map_or("", |m| m.as_str());
        (group(1), group(2))
    } else if DIGITS_FORM.is_match(trimmed) {
        // One or two digits are an hour; three or four end with the minutes.
        match trimmed.len() {
            1 | 2 => (trimmed, "0"),
            n => trimmed.split_at(n - 2),
        }
    } else {
        return Err(invalid());
    };

    let hour = hour.parse::<u8>().map_err(|_| invalid())?;
    let minute = minute.parse::<u8>().map_err(|_| invalid())?;
    TimeOfDay::new(hour, minute).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(h: u8, m: u8) -> TimeOfDay {
        TimeOfDay::new(h, m).unwrap()
    }

    #[test]
    fn test_digit_forms() {
        assert_eq!(parse_freeform_time("7").unwrap(), tod(7, 0));
        assert_eq!(parse_freeform_time("07").unwrap(), tod(7, 0));
        assert_eq!(parse_freeform_time("700").unwrap(), tod(7, 0));
        assert_eq!(parse_freeform_time("0700").unwrap(), tod(7, 0));
        assert_eq!(parse_freeform_time("1930").unwrap(), tod(19, 30));
    }

    #[test]
    fn test_colon_forms() {
        assert_eq!(parse_freeform_time("7:00").unwrap(), tod(7, 0));
        assert_eq!(parse_freeform_time("19:30").unwrap(), tod(19, 30));
        assert_eq!(parse_freeform_time(" 23:59 ").unwrap(), tod(23, 59));
    }

    #[test]
    fn test_rejects_out_of_range() {
        for input in ["25:00", "999", "24", "12:60", "2400"] {
            assert!(
                matches!(
                    parse_freeform_time(input),
                    Err(BeaconError::InvalidTimeFormat(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_garbage() {
        for input in ["", "noon", "7:0", "12345", "-1", "7.30"] {
            assert!(parse_freeform_time(input).is_err(), "{input} should be rejected");
        }
    }
}
