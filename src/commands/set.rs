//! Set command: commit a new target time and mode to the shared record.

use anyhow::{Result, anyhow};

use crate::record::DisplayMode;

/// Handle the set command.
///
/// `time` is free-form ("7", "0730", "19:30"). Without `mode` the current
/// mode is kept.
pub fn handle_set_command(
    config_dir: Option<&str>,
    time: &str,
    mode: Option<&str>,
    debug_enabled: bool,
) -> Result<()> {
    log_version!();

    let mode = mode
        .map(|m| m.parse::<DisplayMode>().map_err(|e| anyhow!(e)))
        .transpose()?;

    let config = super::load_config(config_dir)?;
    let mut beacon = super::connect_real(&config, debug_enabled)?;
    let mode = mode.unwrap_or_else(|| beacon.session().cached_record().mode());

    match beacon.edit_target_input(time, mode) {
        Ok(marker) => {
            let record = *beacon.session().cached_record();
            log_block_start!("Updated shared target {marker}");
            log_indented!("Target: {}", record.target_time());
            log_indented!("Mode:   {}", record.mode().display_name());
            if record.reached() {
                log_indented!("Already past today, marked as reached");
            }
            log_end!();
            Ok(())
        }
        Err(e) => {
            log_pipe!();
            log_error!("{e}");
            if e.is_recoverable() {
                log_indented!("Nothing was written; try again");
            }
            log_end!();
            Err(e.into())
        }
    }
}

/// Display detailed help for the set command.
pub fn display_help() {
    log_version!();
    log_block_start!("set - Change the shared target");
    log_block_start!("Usage: timebeacon set <time> [up|down]");
    log_block_start!("Arguments:");
    log_indented!("time   Target time of day: 7, 07, 700, 0700, 7:00, 19:30");
    log_indented!("mode   'up' counts up from the target once reached");
    log_indented!("       'down' counts down to the target only");
    log_indented!("       Defaults to the current mode");
    log_block_start!("Notes:");
    log_indented!("A target that has already passed today is marked reached at once.");
    log_indented!("Every client picks the change up within one refresh interval.");
    log_end!();
}
