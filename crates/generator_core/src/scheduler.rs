//! Repeating timers expressed as handles and deadlines.
//!
//! A scheduler never invokes callbacks itself. The owner asks for the handles
//! whose deadlines have passed and routes each firing to whoever holds the
//! handle, so a cancelled handle can never mutate anything.

use std::{collections::HashMap, time::Duration};

use shared::domain::TickHandle;

use crate::clock::Clock;

/// Most firings a single timer reports from one `take_due` call.
pub const MAX_CATCH_UP: u32 = 32;

pub trait Scheduler: Send {
    /// Registers a repeating timer whose first firing is one `period` from now.
    fn every(&mut self, period: Duration) -> TickHandle;
    /// Drops the timer. Returns whether the handle was live.
    fn cancel(&mut self, handle: TickHandle) -> bool;
    /// Earliest pending firing across all live timers.
    fn next_deadline(&self) -> Option<Duration>;
    /// Every firing due at the current time, oldest first. A timer that fell
    /// several periods behind is reported once per missed period, up to
    /// [`MAX_CATCH_UP`]; older misses are skipped.
    fn take_due(&mut self) -> Vec<TickHandle>;
    fn live_handles(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct RepeatingTimer {
    period: Duration,
    next_due: Duration,
}

#[derive(Debug)]
pub struct TimerQueue<C: Clock> {
    clock: C,
    next_handle: u64,
    timers: HashMap<TickHandle, RepeatingTimer>,
}

impl<C: Clock> TimerQueue<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            next_handle: 1,
            timers: HashMap::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn every(&mut self, period: Duration) -> TickHandle {
        // A zero period would report an unbounded number of firings.
        let period = period.max(Duration::from_millis(1));
        let handle = TickHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.insert(
            handle,
            RepeatingTimer {
                period,
                next_due: self.clock.now() + period,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TickHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.values().map(|timer| timer.next_due).min()
    }

    fn take_due(&mut self) -> Vec<TickHandle> {
        let now = self.clock.now();
        let mut due = Vec::new();
        for (handle, timer) in self.timers.iter_mut() {
            if timer.next_due > now {
                continue;
            }
            let late = (now - timer.next_due).as_nanos();
            let period = timer.period.as_nanos();
            let missed = (late / period).saturating_add(1);
            let reported = u32::try_from(missed).map_or(MAX_CATCH_UP, |n| n.min(MAX_CATCH_UP));
            let last = now - nanos(late % period);
            // Only the newest firings survive a long stall.
            for n in (0..reported).rev() {
                due.push((last - timer.period * n, *handle));
            }
            timer.next_due = last + timer.period;
        }
        due.sort();
        due.into_iter().map(|(_, handle)| handle).collect()
    }

    fn live_handles(&self) -> usize {
        self.timers.len()
    }
}

/// `value` is always below some period's nanos, so the seconds fit.
fn nanos(value: u128) -> Duration {
    Duration::new((value / 1_000_000_000) as u64, (value % 1_000_000_000) as u32)
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
