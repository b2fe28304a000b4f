//! Toggle command: pin the shared reached flag by hand.

use anyhow::Result;

/// Handle the toggle command. `None` flips the flag as currently shown.
pub fn handle_toggle_command(
    config_dir: Option<&str>,
    state: Option<bool>,
    debug_enabled: bool,
) -> Result<()> {
    log_version!();

    let config = super::load_config(config_dir)?;
    let mut beacon = super::connect_real(&config, debug_enabled)?;

    let result = match state {
        Some(reached) => beacon.set_forced(reached),
        None => beacon.toggle_forced(),
    };

    match result {
        Ok(marker) => {
            let record = *beacon.session().cached_record();
            let shown = if record.reached() { "reached" } else { "not reached" };
            log_block_start!("Pinned {} as {shown} {marker}", record.target_time());
            log_indented!("Holds until the next edit or the next natural crossing");
            log_end!();
            Ok(())
        }
        Err(e) => {
            log_pipe!();
            log_error!("{e}");
            log_end!();
            Err(e.into())
        }
    }
}

/// Display detailed help for the toggle command.
pub fn display_help() {
    log_version!();
    log_block_start!("toggle - Pin the reached flag");
    log_block_start!("Usage: timebeacon toggle [on|off]");
    log_block_start!("Arguments:");
    log_indented!("on    Mark the target as reached now");
    log_indented!("off   Mark the target as not reached");
    log_indented!("      Without an argument the current state is flipped");
    log_end!();
}
