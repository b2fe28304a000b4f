//! # timebeacon
//!
//! A shared countdown beacon: any number of clients watch one target
//! time-of-day, see how long remains (or how long has passed), and may change
//! the target or pin the "reached" flag for everyone.
//!
//! ## Architecture
//!
//! - **Clock**: `time::source` pairs a real or simulated `TimeSource` with the
//!   beacon's fixed time zone; `time::parse` reads free-form times like "0730".
//! - **Record**: `record` defines the shared record and its update marker.
//! - **Store**: `store` holds the single shared record (memory, JSON file or
//!   SQLite) and assigns strictly increasing markers.
//! - **Core**: `core` evaluates the reached state, reconciles client sessions
//!   with the store, commits edits and runs the refresh loop.
//! - **Infrastructure**: configuration, signal handling, logging and the
//!   command-line surface.

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod io;
pub mod record;
pub mod store;
pub mod time;

pub use core::{Beacon, BeaconView, CancellationToken, Presenter, RefreshLoop};
pub use errors::{BeaconError, BeaconResult};
pub use record::{DisplayMode, RecordFields, SharedRecord, TimeOfDay, UpdateMarker};
pub use store::RecordStore;
