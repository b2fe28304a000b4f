//! Small helpers shared by the commands and the presenter.

use chrono::TimeDelta;
use std::path::{Path, PathBuf};

/// Replace the home directory prefix with `~` for display.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Directory for persistent state, following XDG_STATE_HOME.
pub fn state_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local/state")
        })
        .join(crate::common::constants::CONFIG_DIR_NAME)
}

/// Split a non-negative duration into whole hours, minutes and seconds.
///
/// Fractional seconds are truncated. Negative input is treated as zero.
pub fn split_hms(duration: TimeDelta) -> (i64, i64, i64) {
    let total = duration.num_seconds().max(0);
    (total / 3600, (total % 3600) / 60, total % 60)
}

/// Format a duration as `HH:MM:SS`; hours may exceed two digits.
pub fn format_hms(duration: TimeDelta) -> String {
    let (hours, minutes, seconds) = split_hms(duration);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_hms_truncates_fraction() {
        let d = TimeDelta::milliseconds(3_723_999);
        assert_eq!(split_hms(d), (1, 2, 3));
    }

    #[test]
    fn test_split_hms_negative_is_zero() {
        assert_eq!(split_hms(TimeDelta::seconds(-5)), (0, 0, 0));
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(TimeDelta::seconds(1)), "00:00:01");
        assert_eq!(format_hms(TimeDelta::seconds(86_399)), "23:59:59");
    }
}
