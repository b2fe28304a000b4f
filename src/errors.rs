//! Error taxonomy shared by the store backends and the beacon core.
//!
//! None of these errors is fatal: a failed edit leaves the session untouched so
//! it can be retried, and a failed read keeps the last-known-good state on
//! screen until the next refresh.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeaconError {
    /// User input that is not a valid time-of-day. Re-prompt, no state change.
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// The store could not be read.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A write to the store did not complete.
    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),

    /// The persisted record is malformed. Backends treat this as not-found and
    /// re-materialize defaults; it only escapes when that also fails.
    #[error("Store record corrupt: {0}")]
    StoreCorrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BeaconError {
    /// Whether the refresh loop should keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BeaconError::InvalidTimeFormat(_)
            | BeaconError::StoreUnavailable(_)
            | BeaconError::StoreWriteFailed(_)
            | BeaconError::StoreCorrupt(_) => true,
            BeaconError::Config(_) => false,
        }
    }
}

pub type BeaconResult<T> = Result<T, BeaconError>;
