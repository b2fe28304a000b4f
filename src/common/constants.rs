//! Application-wide constants: defaults, limits and file names.

use std::time::Duration;

// # Shared record defaults
// Materialized once on cold start; every client must agree on these.
pub const DEFAULT_TARGET_HOUR: u8 = 23;
pub const DEFAULT_TARGET_MINUTE: u8 = 59;

// # Configuration defaults
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_STORE: &str = "file";
pub const DEFAULT_REFRESH_INTERVAL: u64 = 1000; // milliseconds

// # Validation limits
pub const MINIMUM_REFRESH_INTERVAL: u64 = 100; // milliseconds
pub const MAXIMUM_REFRESH_INTERVAL: u64 = 60_000; // milliseconds

// # Simulation
/// Slowest accepted speed-up for `simulate`. Zero still means fast-forward.
pub const MINIMUM_SIMULATION_MULTIPLIER: f64 = 0.01;

// # Refresh loop
/// Longest uninterrupted sleep inside the refresh loop, so that cancellation
/// is noticed quickly even with long refresh intervals.
pub const CANCELLATION_POLL_SLICE: Duration = Duration::from_millis(100);
/// How often the terminal presenter prints the countdown outside debug mode.
pub const STATUS_LOG_INTERVAL_SECS: i64 = 60;

// # File names
pub const CONFIG_DIR_NAME: &str = "timebeacon";
pub const CONFIG_FILE_NAME: &str = "timebeacon.toml";
pub const FILE_STORE_NAME: &str = "beacon.json";
pub const SQLITE_STORE_NAME: &str = "beacon.db";

// # Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
