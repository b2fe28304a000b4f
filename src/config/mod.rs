//! Configuration system for timebeacon.
//!
//! Settings live in `timebeacon.toml`, searched in:
//! 1. the directory given with `--config <dir>`
//! 2. `XDG_CONFIG_HOME/timebeacon/timebeacon.toml`
//!
//! A commented default file is written on first use.
//!
//! ```toml
//! #[Time]
//! timezone = "Asia/Tokyo"  # IANA zone used for every time-of-day comparison
//!
//! #[Store]
//! store = "file"           # Shared record backend: "file", "sqlite" or "memory"
//! # store_path = "..."     # Defaults to XDG_STATE_HOME/timebeacon/beacon.{json,db}
//!
//! #[Refresh]
//! refresh_interval = 1000  # Milliseconds between refresh cycles (100-60000)
//! ```
//!
//! Every client sharing a store should use the same `timezone`; the target
//! time-of-day is interpreted in it.

pub mod builder;
pub mod loading;
pub mod validation;


use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils;
use crate::errors::{BeaconError, BeaconResult};

pub use builder::create_default_config;
pub use loading::{get_config_path, load, load_from_path};

/// Backend used for the shared record.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local. Only clients inside one `timebeacon` process share it.
    Memory,
    /// JSON document with an advisory lock file.
    File,
    /// SQLite database, suitable for many processes or a network share.
    Sqlite,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::File => "file",
            StoreKind::Sqlite => "sqlite",
        }
    }
}

/// Settings loaded from `timebeacon.toml`. Unset fields fall back to defaults.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// IANA time zone name, e.g. "Asia/Tokyo" or "Europe/Berlin".
    pub timezone: Option<String>,
    pub store: Option<StoreKind>,
    pub store_path: Option<String>,
    pub refresh_interval: Option<u64>, // milliseconds
}

impl Config {
    pub fn timezone(&self) -> BeaconResult<Tz> {
        let name = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        name.parse::<Tz>()
            .map_err(|_| BeaconError::Config(format!("unknown time zone '{name}'")))
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store.unwrap_or(StoreKind::File)
    }

    /// Location of the store, defaulting to the XDG state directory.
    pub fn store_path(&self, kind: StoreKind) -> PathBuf {
        if let Some(path) = self.store_path.as_deref() {
            if let Some(rest) = path.strip_prefix("~/")
                && let Some(home) = dirs::home_dir()
            {
                return home.join(rest);
            }
            return PathBuf::from(path);
        }
        let file_name = match kind {
            StoreKind::Sqlite => SQLITE_STORE_NAME,
            StoreKind::File | StoreKind::Memory => FILE_STORE_NAME,
        };
        utils::state_dir().join(file_name)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL))
    }

    /// Print the effective settings.
    pub fn log_config(&self) {
        let kind = self.store_kind();
        log_block_start!("Loaded configuration");
        log_indented!(
            "Time zone: {}",
            self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
        );
        match kind {
            StoreKind::Memory => log_indented!("Store: memory (this process only)"),
            _ => log_indented!(
                "Store: {} at {}",
                kind.as_str(),
                utils::private_path(&self.store_path(kind))
            ),
        }
        log_indented!(
            "Refresh interval: {} ms",
            self.refresh_interval().as_millis()
        );
    }
}
