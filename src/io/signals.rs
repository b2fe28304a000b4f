//! Shutdown signal handling.
//!
//! SIGINT, SIGTERM and SIGHUP cancel the refresh loop's token. The loop notices
//! within one poll slice, finishes its current tick and returns, so the
//! process exits cleanly instead of being killed mid-write.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::thread;

use crate::core::CancellationToken;

/// Signals that request shutdown.
pub const SHUTDOWN_SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGHUP];

/// Human name for a shutdown signal.
pub fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "unknown signal",
    }
}

/// Spawn a thread that cancels `token` on the first shutdown signal.
pub fn install_shutdown_handler(token: CancellationToken, debug_enabled: bool) -> Result<()> {
    let mut signals =
        Signals::new(SHUTDOWN_SIGNALS).context("failed to register signal handlers")?;

    thread::Builder::new()
        .name("timebeacon-signals".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                if debug_enabled {
                    log_pipe!();
                    log_debug!("Received {}, stopping refresh loop", signal_name(sig));
                }
                token.cancel();
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(SIGINT), "SIGINT");
        assert_eq!(signal_name(SIGTERM), "SIGTERM");
        assert_eq!(signal_name(SIGHUP), "SIGHUP");
        assert_eq!(signal_name(0), "unknown signal");
    }
}
