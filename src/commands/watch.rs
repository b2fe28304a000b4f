//! Watch command: follow the shared beacon in the terminal.
//!
//! Runs the refresh loop until a shutdown signal arrives. State changes are
//! logged as they happen; the countdown itself is printed once a minute, or
//! on every tick with `--debug`.

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;

use crate::common::constants::STATUS_LOG_INTERVAL_SECS;
use crate::config::Config;
use crate::core::{Beacon, BeaconView, CancellationToken, Presenter, RefreshLoop};
use crate::errors::BeaconError;
use crate::io::signals::install_shutdown_handler;
use crate::record::UpdateMarker;

/// Renders beacon views through the logger.
pub struct TerminalPresenter {
    debug_enabled: bool,
    last_state: Option<(UpdateMarker, bool)>,
    last_status: Option<DateTime<Tz>>,
    store_failing: bool,
    error_this_tick: bool,
}

impl TerminalPresenter {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            last_state: None,
            last_status: None,
            store_failing: false,
            error_this_tick: false,
        }
    }

    fn log_state(&self, view: &BeaconView) {
        let record = &view.record;
        log_block_start!(
            "Target {} ({}) {}",
            record.target_time(),
            record.mode().display_name(),
            record.update_marker
        );
        if view.reached {
            let how = if record.forced_override() {
                "pinned"
            } else {
                "by the clock"
            };
            log_indented!("Reached ({how})");
        } else {
            log_indented!("Waiting");
        }
    }

    fn log_status(&self, view: &BeaconView) {
        match view.countdown {
            Some(countdown) => log_decorated!(
                "{} {}  {} {}",
                view.date_text(),
                view.clock_text(),
                countdown.hms_text(),
                countdown.label
            ),
            None => log_decorated!("{} {}  time's up", view.date_text(), view.clock_text()),
        }
    }
}

impl Presenter for TerminalPresenter {
    fn render(&mut self, view: &BeaconView) {
        if self.store_failing && !self.error_this_tick {
            log_pipe!();
            log_info!("Store reachable again");
            self.store_failing = false;
        }
        self.error_this_tick = false;

        let state = (view.record.update_marker, view.reached);
        let changed = self.last_state != Some(state);
        if changed {
            self.log_state(view);
            self.last_state = Some(state);
        }

        if changed || status_due(self.last_status, view.now, self.debug_enabled) {
            self.log_status(view);
            self.last_status = Some(view.now);
        }
    }

    fn celebrate(&mut self, view: &BeaconView) {
        log_pipe!();
        log_info!(
            "🎉 {} reached at {}",
            view.record.target_time(),
            view.clock_text()
        );
    }

    fn store_error(&mut self, error: &BeaconError) {
        self.error_this_tick = true;
        if !self.store_failing {
            log_pipe!();
            log_warning!("{error}");
            log_indented!("Showing the last known state until the store recovers");
            self.store_failing = true;
        }
    }
}

/// Whether the periodic status line should be printed at `now`.
pub(crate) fn status_due(last: Option<DateTime<Tz>>, now: DateTime<Tz>, debug_enabled: bool) -> bool {
    if debug_enabled {
        return true;
    }
    match last {
        None => true,
        Some(last) => (now - last).num_seconds() >= STATUS_LOG_INTERVAL_SECS,
    }
}

/// Run the refresh loop with a terminal presenter until shutdown.
pub fn run_loop(beacon: Beacon, config: &Config, debug_enabled: bool) -> Result<()> {
    let token = CancellationToken::new();
    install_shutdown_handler(token.clone(), debug_enabled)?;

    let mut presenter = TerminalPresenter::new(debug_enabled);
    let mut refresh = RefreshLoop::new(beacon, config.refresh_interval(), token);
    let ticks = refresh.run(&mut presenter);

    log_block_start!("Stopped after {ticks} refresh cycles");
    log_end!();
    Ok(())
}

/// Handle the watch command.
pub fn handle_watch_command(config_dir: Option<&str>, debug_enabled: bool) -> Result<()> {
    log_version!();
    if debug_enabled {
        log_pipe!();
        log_debug!("Debug mode enabled - logging every refresh cycle");
    }

    let config = super::load_config(config_dir)?;
    config.log_config();
    let beacon = super::attach_real(&config, debug_enabled)?;
    log_block_start!(
        "Watching the {} store",
        beacon.store().backend_name()
    );

    run_loop(beacon, &config, debug_enabled)
}

/// Display detailed help for the watch command.
pub fn display_help() {
    log_version!();
    log_block_start!("watch - Follow the shared beacon");
    log_block_start!("Usage: timebeacon [watch] [OPTIONS]");
    log_block_start!("Description:");
    log_indented!("Polls the shared record every refresh_interval milliseconds and");
    log_indented!("shows the time remaining until the target, or elapsed since it.");
    log_indented!("Stops cleanly on Ctrl+C, SIGTERM or SIGHUP.");
    log_block_start!("Options:");
    log_indented!("-d, --debug   Print the countdown on every refresh");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::source::parse_datetime_in_tz;

    fn at(s: &str) -> DateTime<Tz> {
        parse_datetime_in_tz(s, chrono_tz::Asia::Tokyo).unwrap()
    }

    #[test]
    fn test_status_due_every_minute() {
        let last = Some(at("2025-01-10 12:00:00"));
        assert!(status_due(None, at("2025-01-10 12:00:00"), false));
        assert!(!status_due(last, at("2025-01-10 12:00:59"), false));
        assert!(status_due(last, at("2025-01-10 12:01:00"), false));
    }

    #[test]
    fn test_status_due_always_in_debug() {
        let last = Some(at("2025-01-10 12:00:00"));
        assert!(status_due(last, at("2025-01-10 12:00:01"), true));
    }
}
