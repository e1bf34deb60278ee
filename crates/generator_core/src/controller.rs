//! Session state machine: Idle/Active, the accumulated total, and the one
//! repeating tick handle that exists exactly while the session is Active.

use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::{
    domain::{SessionSnapshot, SessionState, SessionSummary, TickHandle},
    protocol::SessionEvent,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    config::{GeneratorConfig, MAX_INCREMENT_MB},
    scheduler::Scheduler,
};

const EVENT_CAPACITY: usize = 256;

pub struct GenerationController<S: Scheduler> {
    scheduler: S,
    state: SessionState,
    total_generated_mb: f64,
    tick_handle: Option<TickHandle>,
    tick_period: Duration,
    max_increment_mb: f64,
    rng: StdRng,
    events: broadcast::Sender<SessionEvent>,
}

impl<S: Scheduler> GenerationController<S> {
    pub fn new(scheduler: S, config: &GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            scheduler,
            state: SessionState::Idle,
            total_generated_mb: starting_total(config.initial_total_mb),
            tick_handle: None,
            tick_period: config.tick_period,
            max_increment_mb: increment_bound(config.max_increment_mb),
            rng,
            events,
        }
    }

    pub fn start(&mut self) -> SessionState {
        if self.state.is_active() {
            return self.state;
        }

        self.release_handle();
        let handle = self.scheduler.every(self.tick_period);
        self.tick_handle = Some(handle);
        self.state = SessionState::Active;
        info!(
            "generator: session started handle={} period_ms={} total_mb={:.2}",
            handle.0,
            self.tick_period.as_millis(),
            self.total_generated_mb
        );
        self.publish(SessionEvent::StateChanged(self.snapshot()));
        self.state
    }

    pub fn stop(&mut self) -> Option<SessionSummary> {
        if !self.state.is_active() {
            return None;
        }

        self.release_handle();
        self.state = SessionState::Idle;
        let summary = SessionSummary {
            total_generated_mb: self.total_generated_mb,
        };
        info!(
            "generator: session stopped total_mb={:.2}",
            summary.total_generated_mb
        );
        self.publish(SessionEvent::StateChanged(self.snapshot()));
        self.publish(SessionEvent::Paused(summary));
        Some(summary)
    }

    /// Stops without emitting a pause summary. Safe in any state.
    pub fn release(&mut self) {
        let had_handle = self.release_handle();
        let was_active = self.state.is_active();
        self.state = SessionState::Idle;
        if was_active {
            self.publish(SessionEvent::StateChanged(self.snapshot()));
        }
        if had_handle || was_active {
            info!(
                "generator: session released total_mb={:.2}",
                self.total_generated_mb
            );
        }
    }

    /// Applies one firing of `handle`. Firings of anything but the live handle
    /// are dropped, which covers ticks that were already due when the session
    /// was stopped.
    pub fn on_tick(&mut self, handle: TickHandle) -> Option<f64> {
        if !self.state.is_active() || self.tick_handle != Some(handle) {
            warn!(
                "generator: ignoring tick handle={} state={:?} live={:?}",
                handle.0,
                self.state,
                self.tick_handle.map(|h| h.0)
            );
            return None;
        }

        let increment = self.rng.gen_range(0.0..self.max_increment_mb);
        self.total_generated_mb = round_mb(self.total_generated_mb + increment);
        debug!(
            "generator: tick increment_mb={:.4} total_mb={:.2}",
            increment, self.total_generated_mb
        );
        self.publish(SessionEvent::TotalChanged(self.snapshot()));
        Some(increment)
    }

    /// Routes every due firing to `on_tick`. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        self.scheduler
            .take_due()
            .into_iter()
            .filter_map(|handle| self.on_tick(handle))
            .count()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            total_generated_mb: self.total_generated_mb,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tick_handle(&self) -> Option<TickHandle> {
        self.tick_handle
    }

    pub fn live_tick_handles(&self) -> usize {
        self.scheduler.live_handles()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn release_handle(&mut self) -> bool {
        match self.tick_handle.take() {
            Some(handle) => self.scheduler.cancel(handle),
            None => false,
        }
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

impl<S: Scheduler> Drop for GenerationController<S> {
    fn drop(&mut self) {
        self.release_handle();
    }
}

/// `gen_range` needs a non-empty range, so an unusable bound falls back to the
/// default instead of panicking on the first tick.
fn increment_bound(max_increment_mb: f64) -> f64 {
    if max_increment_mb.is_finite() && max_increment_mb > 0.0 {
        max_increment_mb
    } else {
        warn!("generator: invalid max_increment_mb={max_increment_mb}, using {MAX_INCREMENT_MB}");
        MAX_INCREMENT_MB
    }
}

fn starting_total(initial_total_mb: f64) -> f64 {
    if initial_total_mb.is_finite() {
        round_mb(initial_total_mb.max(0.0))
    } else {
        warn!("generator: invalid initial_total_mb={initial_total_mb}, starting from 0");
        0.0
    }
}

/// Totals are kept at display precision so repeated additions never drift.
pub fn round_mb(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
