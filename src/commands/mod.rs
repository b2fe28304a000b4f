//! Command-line command handlers for timebeacon.
//!
//! Each command lives in its own submodule. They all load the configuration,
//! open the configured store and talk to it through a [`Beacon`], so every
//! command behaves like one more client of the shared record.

pub mod get;
pub mod help;
pub mod set;
pub mod simulate;
pub mod toggle;
pub mod watch;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{self, Config};
use crate::core::Beacon;
use crate::store::{self, RecordStore};
use crate::time::source::Clock;
use std::sync::Arc;

/// Load the configuration from `config_dir` (or the default location).
pub(crate) fn load_config(config_dir: Option<&str>) -> Result<Config> {
    config::load(config_dir.map(Path::new))
}

/// Open the configured store and connect a beacon driven by `clock`.
pub(crate) fn connect(config: &Config, clock: Clock, debug_enabled: bool) -> Result<Beacon> {
    let store = store::open(config).context("Failed to open the shared store")?;
    let beacon = Beacon::connect(store, clock)
        .context("Failed to read the shared record")?
        .with_debug(debug_enabled);
    Ok(beacon)
}

/// Start a beacon on `store` even if the store cannot be reached yet. The
/// first successful refresh then adopts the shared record.
pub(crate) fn attach(store: Arc<dyn RecordStore>, clock: Clock, debug_enabled: bool) -> Beacon {
    match Beacon::connect(store.clone(), clock.clone()) {
        Ok(beacon) => beacon.with_debug(debug_enabled),
        Err(e) => {
            log_pipe!();
            log_warning!("{e}");
            log_indented!("Starting from defaults, retrying every refresh cycle");
            Beacon::new(store, clock).with_debug(debug_enabled)
        }
    }
}

/// Open the configured store for a long-running watcher on the real clock.
pub(crate) fn attach_real(config: &Config, debug_enabled: bool) -> Result<Beacon> {
    let tz = config.timezone()?;
    let store = store::open(config).context("Failed to open the shared store")?;
    Ok(attach(store, Clock::real(tz), debug_enabled))
}

/// Connect a beacon on the real clock in the configured zone.
pub(crate) fn connect_real(config: &Config, debug_enabled: bool) -> Result<Beacon> {
    let tz = config.timezone()?;
    connect(config, Clock::real(tz), debug_enabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BeaconError;
    use crate::record::UpdateMarker;
    use crate::store::MockRecordStore;

    #[test]
    fn test_attach_survives_unreachable_store() {
        let mut store = MockRecordStore::new();
        store
            .expect_ensure_initialized()
            .returning(|| Err(BeaconError::StoreUnavailable("no route to host".into())));
        store
            .expect_latest_or_default()
            .returning(|| Err(BeaconError::StoreUnavailable("no route to host".into())));

        let mut beacon = attach(Arc::new(store), Clock::real(chrono_tz::UTC), false);
        assert_eq!(beacon.session().last_seen_marker(), UpdateMarker::NONE);

        let report = beacon.tick();
        assert!(matches!(report.error, Some(BeaconError::StoreUnavailable(_))));
    }
}
