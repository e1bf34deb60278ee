//! Pull-based animations.
//!
//! Nothing here runs on its own. Each animation records where it started and
//! computes its value from the clock whenever it is read, so reads are cheap,
//! reproducible and work without a render loop.

use std::time::Duration;

use shared::domain::ProgressTarget;

use crate::clock::Clock;

/// Cubic ease-in-out over `t` in [0, 1].
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// An eased interpolation from `from` to `to` starting at a clock offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    started_at: Duration,
    duration: Duration,
}

impl Tween {
    pub fn new(from: f64, to: f64, started_at: Duration, duration: Duration) -> Self {
        Self {
            from,
            to,
            started_at,
            duration,
        }
    }

    pub fn settled(value: f64) -> Self {
        Self::new(value, value, Duration::ZERO, Duration::ZERO)
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    pub fn is_finished_at(&self, now: Duration) -> bool {
        now.saturating_sub(self.started_at) >= self.duration
    }

    pub fn value_at(&self, now: Duration) -> f64 {
        if self.is_finished_at(now) {
            return self.to;
        }
        let elapsed = now.saturating_sub(self.started_at);
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * ease_in_out(progress)
    }
}

/// Progress bar fill that follows the session state.
///
/// Activation and deactivation use different durations. Retargeting to the
/// target already being approached does nothing; reversing continues from the
/// value currently shown.
#[derive(Debug, Clone)]
pub struct ProgressAnimator<C: Clock> {
    clock: C,
    target: ProgressTarget,
    tween: Tween,
    activate_duration: Duration,
    deactivate_duration: Duration,
}

impl<C: Clock> ProgressAnimator<C> {
    pub fn new(clock: C, activate_duration: Duration, deactivate_duration: Duration) -> Self {
        Self {
            clock,
            target: ProgressTarget::Empty,
            tween: Tween::settled(ProgressTarget::Empty.value()),
            activate_duration,
            deactivate_duration,
        }
    }

    /// Returns whether a new transition was started.
    pub fn set_target(&mut self, target: ProgressTarget) -> bool {
        if target == self.target {
            return false;
        }

        let now = self.clock.now();
        let from = self.tween.value_at(now);
        let duration = match target {
            ProgressTarget::Full => self.activate_duration,
            ProgressTarget::Empty => self.deactivate_duration,
        };
        self.tween = Tween::new(from, target.value(), now, duration);
        self.target = target;
        true
    }

    pub fn value(&self) -> f64 {
        self.tween.value_at(self.clock.now()).clamp(0.0, 1.0)
    }

    pub fn target(&self) -> ProgressTarget {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.tween.is_finished_at(self.clock.now())
    }
}

/// Looping scale pulse for the generator icon: rest, swell to `peak`, settle,
/// repeat. Reads exactly 1.0 while stopped.
#[derive(Debug, Clone)]
pub struct PulseAnimator<C: Clock> {
    clock: C,
    started_at: Option<Duration>,
    leg: Duration,
    peak: f64,
}

impl<C: Clock> PulseAnimator<C> {
    pub fn new(clock: C, leg: Duration, peak: f64) -> Self {
        Self {
            clock,
            started_at: None,
            leg: leg.max(Duration::from_millis(1)),
            peak,
        }
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn value(&self) -> f64 {
        let Some(started_at) = self.started_at else {
            return 1.0;
        };

        let leg = self.leg.as_nanos();
        let phase = self.clock.now().saturating_sub(started_at).as_nanos() % (leg * 2);
        let swell = self.peak - 1.0;
        if phase < leg {
            1.0 + swell * ease_in_out(phase as f64 / leg as f64)
        } else {
            self.peak - swell * ease_in_out((phase - leg) as f64 / leg as f64)
        }
    }
}

#[cfg(test)]
#[path = "tests/animator_tests.rs"]
mod tests;
