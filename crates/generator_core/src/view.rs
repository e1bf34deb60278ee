//! Glue between a rendering layer and one generation session.
//!
//! The view owns the controller and its animations for the lifetime of the
//! screen. User intent only reaches the session through [`SessionView::toggle`],
//! and the animations are always retargeted from the controller's resulting
//! state, never from the intent itself.

use std::time::Duration;

use shared::{
    domain::{DataStats, ProgressTarget, SessionSnapshot, SessionState, SessionSummary},
    protocol::SessionEvent,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    animator::{ProgressAnimator, PulseAnimator, Tween},
    clock::Clock,
    config::{GeneratorConfig, FADE_IN_DURATION, PULSE_LEG_DURATION, PULSE_PEAK_SCALE},
    controller::GenerationController,
    scheduler::Scheduler,
};

pub const ACTIVE_STATUS: &str =
    "Actively generating data bundles. Keep the app open for maximum efficiency.";
pub const IDLE_STATUS: &str = "Generator is currently inactive. Toggle to start.";
pub const ACTIVE_SUBTITLE: &str = "Actively generating free data bundles";
pub const IDLE_SUBTITLE: &str = "Tap to start generating free data";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToggleOutcome {
    Started,
    AlreadyActive,
    /// Hidden with `pause_when_hidden` set; generation starts once shown.
    Deferred,
    Paused(SessionSummary),
    AlreadyIdle,
    /// The view was already unmounted.
    Ignored,
}

pub struct SessionView<C: Clock, S: Scheduler> {
    clock: C,
    controller: GenerationController<S>,
    progress: ProgressAnimator<C>,
    pulse: PulseAnimator<C>,
    fade_in: Tween,
    pause_when_hidden: bool,
    visible: bool,
    resume_on_show: bool,
    mounted: bool,
}

impl<C: Clock, S: Scheduler> SessionView<C, S> {
    pub fn mount(config: &GeneratorConfig, clock: C, scheduler: S) -> Self {
        let now = clock.now();
        let view = Self {
            controller: GenerationController::new(scheduler, config),
            progress: ProgressAnimator::new(
                clock.clone(),
                config.activate_duration,
                config.deactivate_duration,
            ),
            pulse: PulseAnimator::new(clock.clone(), PULSE_LEG_DURATION, PULSE_PEAK_SCALE),
            fade_in: Tween::new(0.0, 1.0, now, FADE_IN_DURATION),
            pause_when_hidden: config.pause_when_hidden,
            visible: true,
            resume_on_show: false,
            mounted: true,
            clock,
        };
        info!(
            "generator: view mounted total_mb={:.2} pause_when_hidden={}",
            view.controller.snapshot().total_generated_mb,
            view.pause_when_hidden
        );
        view
    }

    pub fn toggle(&mut self, active: bool) -> ToggleOutcome {
        if !self.mounted {
            warn!("generator: toggle after unmount ignored active={active}");
            return ToggleOutcome::Ignored;
        }

        let outcome = if active {
            if self.controller.state().is_active() {
                ToggleOutcome::AlreadyActive
            } else if self.pause_when_hidden && !self.visible {
                info!("generator: view hidden, start deferred until shown");
                self.resume_on_show = true;
                ToggleOutcome::Deferred
            } else {
                self.controller.start();
                ToggleOutcome::Started
            }
        } else {
            self.resume_on_show = false;
            match self.controller.stop() {
                Some(summary) => ToggleOutcome::Paused(summary),
                None => ToggleOutcome::AlreadyIdle,
            }
        };
        self.sync_animations();
        outcome
    }

    /// Applies every tick that has come due. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        self.controller.pump()
    }

    pub fn set_visible(&mut self, visible: bool) {
        if !self.mounted || self.visible == visible {
            return;
        }
        self.visible = visible;
        if !self.pause_when_hidden {
            return;
        }

        if !visible && self.controller.state().is_active() {
            info!("generator: view hidden, pausing generation");
            self.controller.release();
            self.resume_on_show = true;
        } else if visible && self.resume_on_show {
            info!("generator: view shown, resuming generation");
            self.resume_on_show = false;
            self.controller.start();
        }
        self.sync_animations();
    }

    /// Hard cancellation point. Releases the tick handle whatever the state.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.resume_on_show = false;
        self.controller.release();
        self.sync_animations();
        info!("generator: view unmounted");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    pub fn progress(&self) -> f64 {
        self.progress.value()
    }

    pub fn progress_target(&self) -> ProgressTarget {
        self.progress.target()
    }

    pub fn pulse_scale(&self) -> f64 {
        self.pulse.value()
    }

    pub fn content_opacity(&self) -> f64 {
        self.fade_in.value_at(self.clock.now())
    }

    pub fn data_stats(&self) -> DataStats {
        DataStats::from_total(self.snapshot().total_generated_mb)
    }

    pub fn status_text(&self) -> &'static str {
        if self.state().is_active() {
            ACTIVE_STATUS
        } else {
            IDLE_STATUS
        }
    }

    pub fn toggle_subtitle(&self) -> &'static str {
        if self.state().is_active() {
            ACTIVE_SUBTITLE
        } else {
            IDLE_SUBTITLE
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.controller.next_deadline()
    }

    pub fn live_tick_handles(&self) -> usize {
        self.controller.live_tick_handles()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.controller.subscribe_events()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn sync_animations(&mut self) {
        let state = self.controller.state();
        self.progress.set_target(ProgressTarget::from(state));
        if state.is_active() {
            self.pulse.start();
        } else {
            self.pulse.stop();
        }
    }
}

impl<C: Clock, S: Scheduler> Drop for SessionView<C, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
