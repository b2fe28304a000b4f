//! Help command implementation for timebeacon.
//!
//! Shows command-specific help or general help based on the arguments provided.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "get" | "g" => log_block_start!("Usage: timebeacon get [--json]"),
        "set" | "s" => log_block_start!("Usage: timebeacon set <time> [up|down]"),
        "toggle" | "t" => log_block_start!("Usage: timebeacon toggle [on|off]"),
        "simulate" | "S" => log_block_start!("Usage: timebeacon simulate <start> [multiplier]"),
        "help" | "h" => log_block_start!("Usage: timebeacon help [COMMAND]"),
        _ => log_block_start!("Usage: timebeacon [OPTIONS] [COMMAND]"),
    }
}

/// Run the help command (dispatcher)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("get") | Some("g") => super::get::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some("set") | Some("s") => super::set::display_help(),
        Some("simulate") | Some("S") => super::simulate::display_help(),
        Some("toggle") | Some("t") => super::toggle::display_help(),
        Some("watch") | Some("w") => super::watch::display_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {unknown}");
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("watch, w                   Follow the shared beacon (default)");
    log_indented!("get, g [--json]            Print the current state once");
    log_indented!("set, s <time> [up|down]    Change the target time and mode");
    log_indented!("toggle, t [on|off]         Pin the reached flag");
    log_indented!("simulate, S <start> [x]    Watch with a simulated clock");
    log_indented!("help, h [COMMAND]          Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'timebeacon help <command>' to see detailed help for a specific command.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: timebeacon help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("timebeacon help");
    log_indented!("timebeacon help set");
    log_end!();
}
