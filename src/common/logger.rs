//! Structured logging with box-drawing output.
//!
//! Every line produced by timebeacon goes through the macros in this module so
//! that the watch loop, the one-shot commands and error reports share a single
//! visual layout:
//!
//! ```text
//! ┏ timebeacon v0.3.0 ━━╸
//! ┃
//! ┣ Connected to file store
//! ┃   /home/user/.local/state/timebeacon/beacon.json
//! ┣[INFO] Target 23:59 (count up from)
//! ╹
//! ```
//!
//! Logging can be switched off at runtime, which the tests and `get --json`
//! rely on to keep stdout clean.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::time::source::Clock;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Only installed by the simulate command.
static SIMULATION_CLOCK: OnceLock<Clock> = OnceLock::new();

/// Main logging interface.
///
/// ## Conventions
///
/// - `log_block_start!` opens a new conceptual block (a state change, a command
///   result). It prints an empty pipe line followed by `┣ message`.
/// - `log_decorated!` continues the current block with `┣ message`.
/// - `log_indented!` prints detail lines belonging to the previous message.
/// - `log_pipe!` inserts a bare `┃` spacer, typically before a levelled message.
/// - `log_version!` / `log_end!` frame a whole run.
/// - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`
///   carry a coloured `[LEVEL]` tag.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Stamp every line with the simulated time of `clock`.
    ///
    /// Can only be installed once per process; later calls are ignored.
    pub fn set_simulation_clock(clock: Clock) {
        let _ = SIMULATION_CLOCK.set(clock);
    }

    /// Timestamp prefix used by the macros, empty unless simulating.
    pub fn get_timestamp_prefix() -> String {
        match SIMULATION_CLOCK.get() {
            Some(clock) if clock.is_simulated() => {
                format!("[{}] ", clock.now().format("%H:%M:%S"))
            }
            _ => String::new(),
        }
    }
}

// Public because the exported macros expand to it.
pub fn write_output(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(&format!("{prefix}┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(&format!("{prefix}┣ {expr}\n"));
        }
    }};
}

/// Log an indented detail line within a block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(&format!("{prefix}┃   {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(&format!("{prefix}┃   {expr}\n"));
        }
    }};
}

/// Log a bare pipe for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Start a new block of related messages.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(&format!("{prefix}┃\n{prefix}┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(&format!("{prefix}┃\n{prefix}┣ {expr}\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let version = env!("CARGO_PKG_VERSION");
            $crate::common::logger::write_output(&format!("{prefix}┏ timebeacon v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}

/// Log a warning with a yellow tag.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {expr}\n"),
            );
        }
    }};
}

/// Log an error with a red tag.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {expr}\n"),
            );
        }
    }};
}

/// Log an error that ends the current flow, closing the block with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {expr}\n"),
            );
        }
    }};
}

/// Log an informational message with a green tag.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {expr}\n"),
            );
        }
    }};
}

/// Log an operational detail, shown with `--debug`.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {expr}\n"),
            );
        }
    }};
}

/// Log a critical message with a red tag.
#[macro_export]
macro_rules! log_critical {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($fmt $($arg)*);
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
            );
        }
    }};
    ($expr:expr) => {{
        use $crate::common::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let expr = $expr;
            $crate::common::logger::write_output(
                &format!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {expr}\n"),
            );
        }
    }};
}
