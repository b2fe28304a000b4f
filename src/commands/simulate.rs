//! Simulate command: watch the beacon with an accelerated clock.
//!
//! The simulation runs against an in-memory copy of the shared record, so
//! write-backs made at simulated times never reach the real store.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use std::sync::Arc;

use crate::common::logger::Log;
use crate::core::Beacon;
use crate::record::{RecordFields, SharedRecord, UpdateMarker};
use crate::store::{self, MemoryStore, RecordStore};
use crate::time::source::{Clock, SimulatedTimeSource, parse_datetime_in_tz};

/// Handle the simulate command.
///
/// `start_time` is `YYYY-MM-DD HH:MM:SS` in the configured zone. A multiplier
/// of 0 fast-forwards: every refresh interval passes instantly.
pub fn handle_simulate_command(
    config_dir: Option<&str>,
    start_time: &str,
    multiplier: f64,
    debug_enabled: bool,
) -> Result<()> {
    let config = super::load_config(config_dir)?;
    let tz = config.timezone()?;

    let start = parse_datetime_in_tz(start_time, tz)
        .map_err(|e| anyhow!("Invalid start time: {e}"))?
        .with_timezone(&Utc);

    let clock = Clock::new(Arc::new(SimulatedTimeSource::new(start, multiplier)), tz);
    Log::set_simulation_clock(clock.clone());

    log_version!();
    log_block_start!("Simulating from {start_time} ({tz})");
    if multiplier == 0.0 {
        log_indented!("Fast-forward: refresh intervals pass instantly");
    } else {
        log_indented!("Time runs {multiplier}x faster than real time");
    }

    let seed = seed_record(&config)?;
    let sandbox = MemoryStore::new();
    sandbox
        .write_new(seed.fields)
        .context("Failed to seed the simulation store")?;
    log_indented!(
        "Starting from target {} ({})",
        seed.target_time(),
        seed.mode().display_name()
    );

    let beacon = Beacon::connect(Arc::new(sandbox), clock)?.with_debug(debug_enabled);
    super::watch::run_loop(beacon, &config, debug_enabled)
}

/// The configured store's current record, read without writing.
fn seed_record(config: &crate::config::Config) -> Result<SharedRecord> {
    let shared = store::open(config).context("Failed to open the shared store")?;
    match shared.read_latest() {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Ok(SharedRecord::new(RecordFields::default(), UpdateMarker::NONE)),
        Err(e) => {
            log_warning!("{e}");
            log_indented!("Simulating with default settings");
            Ok(SharedRecord::new(RecordFields::default(), UpdateMarker::NONE))
        }
    }
}

/// Display detailed help for the simulate command.
pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Watch with a simulated clock");
    log_block_start!("Usage: timebeacon simulate <start> [multiplier]");
    log_block_start!("Arguments:");
    log_indented!("start        \"YYYY-MM-DD HH:MM:SS\" in the configured time zone");
    log_indented!("multiplier   Speed-up factor, 0 to fast-forward (default)");
    log_indented!(
        "             Other values must be at least {}",
        crate::common::constants::MINIMUM_SIMULATION_MULTIPLIER
    );
    log_block_start!("Notes:");
    log_indented!("The shared record is copied into memory first; the simulation");
    log_indented!("never writes to the real store.");
    log_block_start!("Examples:");
    log_indented!("timebeacon simulate \"2025-01-10 23:58:00\"");
    log_indented!("timebeacon simulate \"2025-01-10 23:58:00\" 60");
    log_end!();
}
