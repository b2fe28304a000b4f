//! Configuration validation functionality.

use anyhow::Result;
use chrono_tz::Tz;

use super::Config;
use crate::common::constants::*;

/// Reject configurations timebeacon cannot run with.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(name) = config.timezone.as_deref()
        && name.parse::<Tz>().is_err()
    {
        anyhow::bail!(
            "timezone '{}' is not a known IANA time zone (e.g. \"Asia/Tokyo\", \"Europe/Berlin\")",
            name
        );
    }

    if let Some(interval_ms) = config.refresh_interval
        && !(MINIMUM_REFRESH_INTERVAL..=MAXIMUM_REFRESH_INTERVAL).contains(&interval_ms)
    {
        anyhow::bail!(
            "refresh_interval ({} ms) must be between {} and {} milliseconds",
            interval_ms,
            MINIMUM_REFRESH_INTERVAL,
            MAXIMUM_REFRESH_INTERVAL
        );
    }

    if let Some(path) = config.store_path.as_deref()
        && path.trim().is_empty()
    {
        anyhow::bail!("store_path must not be empty; remove it to use the default location");
    }

    Ok(())
}
