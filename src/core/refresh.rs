//! The refresh loop.
//!
//! Ticks a [`Beacon`] on a fixed cadence and hands each result to a
//! [`Presenter`]. The only suspension point is the sleep between ticks, which
//! is taken in short slices so a cancelled [`CancellationToken`] is noticed
//! promptly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{Beacon, BeaconView, TickReport};
use crate::common::constants::CANCELLATION_POLL_SLICE;
use crate::errors::BeaconError;

/// Shared stop flag for a refresh loop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Receives the output of each refresh cycle.
pub trait Presenter {
    /// Draw the current state. Called once per tick.
    fn render(&mut self, view: &BeaconView);

    /// The target was reached and this client has not celebrated it yet.
    fn celebrate(&mut self, _view: &BeaconView) {}

    /// A store operation failed during the tick. The loop keeps going.
    fn store_error(&mut self, _error: &BeaconError) {}
}

/// Drives a beacon until cancelled.
pub struct RefreshLoop {
    beacon: Beacon,
    interval: Duration,
    token: CancellationToken,
    tick_limit: Option<u64>,
}

impl RefreshLoop {
    pub fn new(beacon: Beacon, interval: Duration, token: CancellationToken) -> Self {
        Self {
            beacon,
            interval,
            token,
            tick_limit: None,
        }
    }

    /// Stop after `ticks` cycles even if never cancelled.
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    pub fn beacon(&self) -> &Beacon {
        &self.beacon
    }

    /// Run until the token is cancelled or the tick limit is hit. Returns the
    /// number of ticks performed.
    pub fn run(&mut self, presenter: &mut dyn Presenter) -> u64 {
        let mut ticks = 0;

        while !self.token.is_cancelled() {
            if self.tick_limit.is_some_and(|limit| ticks >= limit) {
                break;
            }

            let report = self.beacon.tick();
            ticks += 1;
            present(presenter, &report);

            self.sleep_cancellable();
        }

        ticks
    }

    fn sleep_cancellable(&self) {
        let clock = self.beacon.clock();
        let mut remaining = self.interval;
        while !remaining.is_zero() && !self.token.is_cancelled() {
            let slice = remaining.min(CANCELLATION_POLL_SLICE);
            clock.sleep(slice);
            remaining -= slice;
        }
    }
}

fn present(presenter: &mut dyn Presenter, report: &TickReport) {
    if let Some(error) = &report.error {
        presenter.store_error(error);
    }
    presenter.render(&report.view);
    if report.celebrate {
        presenter.celebrate(&report.view);
    }
}
