//! Command-line argument parsing and processing.
//!
//! Global flags (`--debug`, `--config <dir>`, `--help`, `--version`) may appear
//! anywhere. The first positional argument selects the command; without one,
//! timebeacon runs the watch loop.

use crate::common::constants::MINIMUM_SIMULATION_MULTIPLIER;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the refresh loop and render the beacon in the terminal
    Watch {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print the current state once
    Get {
        debug_enabled: bool,
        config_dir: Option<String>,
        json: bool,
    },
    /// Commit a new target time, optionally changing the mode
    Set {
        debug_enabled: bool,
        config_dir: Option<String>,
        time: String,
        mode: Option<String>,
    },
    /// Pin the reached flag, or flip it when no state is given
    Toggle {
        debug_enabled: bool,
        config_dir: Option<String>,
        state: Option<bool>,
    },
    /// Watch with a simulated clock
    Simulate {
        debug_enabled: bool,
        config_dir: Option<String>,
        start_time: String,
        multiplier: f64,
    },
    /// Show help, optionally for one command
    Help { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
    /// A known command was given bad arguments
    ShowUsageError { command: String, message: String },
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse the arguments of the current process.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut positional: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = &args_vec[i];
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" => {
                    if let Some(dir) = args_vec.get(i + 1) {
                        config_dir = Some(dir.clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for {arg}");
                        unknown_arg_found = true;
                    }
                }
                _ if arg.starts_with('-') && !is_negative_number(arg) => {
                    log_warning!("Unknown argument: {arg}");
                    unknown_arg_found = true;
                }
                _ => positional.push(arg.clone()),
            }
            i += 1;
        }

        // Help and version take precedence over everything else.
        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let action = match positional.split_first() {
            None => CliAction::Watch {
                debug_enabled,
                config_dir,
            },
            Some((command, rest)) => {
                parse_command(command, rest, debug_enabled, config_dir, json)
            }
        };

        // --json only makes sense for `get`.
        if json && !matches!(action, CliAction::Get { .. } | CliAction::ShowUsageError { .. }) {
            return ParsedArgs {
                action: CliAction::ShowUsageError {
                    command: command_name(&action).to_string(),
                    message: "--json is only supported by 'get'".to_string(),
                },
            };
        }

        ParsedArgs { action }
    }
}

fn parse_command(
    command: &str,
    rest: &[String],
    debug_enabled: bool,
    config_dir: Option<String>,
    json: bool,
) -> CliAction {
    let usage_error = |message: &str| CliAction::ShowUsageError {
        command: command.to_string(),
        message: message.to_string(),
    };

    match command {
        "watch" | "w" => {
            if !rest.is_empty() {
                return usage_error("watch takes no arguments");
            }
            CliAction::Watch {
                debug_enabled,
                config_dir,
            }
        }
        "get" | "g" => {
            if !rest.is_empty() {
                return usage_error("get takes no arguments");
            }
            CliAction::Get {
                debug_enabled,
                config_dir,
                json,
            }
        }
        "set" | "s" => match rest {
            [time] => CliAction::Set {
                debug_enabled,
                config_dir,
                time: time.clone(),
                mode: None,
            },
            [time, mode] => CliAction::Set {
                debug_enabled,
                config_dir,
                time: time.clone(),
                mode: Some(mode.clone()),
            },
            [] => usage_error("missing target time"),
            _ => usage_error("too many arguments"),
        },
        "toggle" | "t" => match rest {
            [] => CliAction::Toggle {
                debug_enabled,
                config_dir,
                state: None,
            },
            [state] => match state.to_lowercase().as_str() {
                "on" | "true" | "1" => CliAction::Toggle {
                    debug_enabled,
                    config_dir,
                    state: Some(true),
                },
                "off" | "false" | "0" => CliAction::Toggle {
                    debug_enabled,
                    config_dir,
                    state: Some(false),
                },
                _ => usage_error("state must be 'on' or 'off'"),
            },
            _ => usage_error("too many arguments"),
        },
        "simulate" | "S" => {
            let (start_time, multiplier) = match rest {
                [start] => (start.clone(), 0.0),
                [start, multiplier] => match multiplier.parse::<f64>() {
                    Ok(m) if m == 0.0 || (m.is_finite() && m >= MINIMUM_SIMULATION_MULTIPLIER) => {
                        (start.clone(), m)
                    }
                    _ => {
                        return usage_error(&format!(
                            "multiplier must be 0 (fast-forward) or at least {MINIMUM_SIMULATION_MULTIPLIER}"
                        ));
                    }
                },
                [] => return usage_error("missing start time"),
                _ => return usage_error("too many arguments"),
            };
            CliAction::Simulate {
                debug_enabled,
                config_dir,
                start_time,
                multiplier,
            }
        }
        "help" | "h" => match rest {
            [] => CliAction::Help { command: None },
            [name] => CliAction::Help {
                command: Some(name.clone()),
            },
            _ => usage_error("too many arguments"),
        },
        _ => {
            log_warning!("Unknown command: {command}");
            CliAction::ShowHelpDueToError
        }
    }
}

fn command_name(action: &CliAction) -> &'static str {
    match action {
        CliAction::Watch { .. } => "watch",
        CliAction::Get { .. } => "get",
        CliAction::Set { .. } => "set",
        CliAction::Toggle { .. } => "toggle",
        CliAction::Simulate { .. } => "simulate",
        CliAction::Help { .. } => "help",
        _ => "timebeacon",
    }
}

fn is_negative_number(arg: &str) -> bool {
    arg.len() > 1 && arg[1..].chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Display version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Display custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("timebeacon [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("watch, w               Follow the shared beacon (default)");
    log_indented!("get, g [--json]        Print the current state once");
    log_indented!("set, s <time> [up|down] Change the target time and mode");
    log_indented!("toggle, t [on|off]     Pin the reached flag");
    log_indented!("simulate, S <start> [multiplier]  Watch with a simulated clock");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_end!();
}
