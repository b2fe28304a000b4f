//! Main application entry point.
//!
//! Parses the command line and dispatches to the command handlers in
//! `timebeacon::commands`. Errors from a command are reported through the
//! logger and turned into a non-zero exit code.

use anyhow::Result;

use timebeacon::args::{self, CliAction, ParsedArgs};
use timebeacon::commands;
use timebeacon::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use timebeacon::common::logger::Log;
use timebeacon::{log_end, log_error, log_indented, log_pipe};

fn run(action: CliAction) -> Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::ShowUsageError { command, message } => {
            log_pipe!();
            log_error!("{message}");
            commands::help::show_command_usage(&command);
            log_indented!("See 'timebeacon help {command}' for details");
            log_end!();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Watch {
            debug_enabled,
            config_dir,
        } => commands::watch::handle_watch_command(config_dir.as_deref(), debug_enabled),
        CliAction::Get {
            debug_enabled,
            config_dir,
            json,
        } => commands::get::handle_get_command(config_dir.as_deref(), json, debug_enabled),
        CliAction::Set {
            debug_enabled,
            config_dir,
            time,
            mode,
        } => commands::set::handle_set_command(
            config_dir.as_deref(),
            &time,
            mode.as_deref(),
            debug_enabled,
        ),
        CliAction::Toggle {
            debug_enabled,
            config_dir,
            state,
        } => commands::toggle::handle_toggle_command(config_dir.as_deref(), state, debug_enabled),
        CliAction::Simulate {
            debug_enabled,
            config_dir,
            start_time,
            multiplier,
        } => commands::simulate::handle_simulate_command(
            config_dir.as_deref(),
            &start_time,
            multiplier,
            debug_enabled,
        ),
    }
}

fn main() {
    let parsed_args = ParsedArgs::from_env();

    if let Err(e) = run(parsed_args.action) {
        // Commands switch logging off for machine-readable output.
        if !Log::is_enabled() {
            eprintln!("Error: {e:#}");
        } else {
            log_pipe!();
            log_error!("{e:#}");
            log_end!();
        }
        std::process::exit(EXIT_FAILURE);
    }

    std::process::exit(EXIT_SUCCESS);
}
