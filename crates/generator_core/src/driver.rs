//! Event loops that feed a mounted view with time.
//!
//! Both loops are single-threaded: they wake for the next tick deadline or
//! frame, apply due ticks, then hand the view to the frame callback, which is
//! where user toggles and rendering happen.

use std::time::Duration;

use tracing::debug;

use crate::{
    clock::{Clock, ManualClock, TokioClock},
    scheduler::Scheduler,
    view::SessionView,
};

const MIN_FRAME: Duration = Duration::from_millis(1);

/// Runs against real (tokio) time for `run_for`. Returns the ticks applied.
pub async fn drive<S, F>(
    view: &mut SessionView<TokioClock, S>,
    run_for: Duration,
    frame: Duration,
    mut on_frame: F,
) -> usize
where
    S: Scheduler,
    F: FnMut(&mut SessionView<TokioClock, S>),
{
    let frame = frame.max(MIN_FRAME);
    let clock = *view.clock();
    let end = clock.now() + run_for;
    let mut applied = 0;

    loop {
        let now = clock.now();
        if now >= end || !view.is_mounted() {
            break;
        }
        let wake = next_wake(view.next_deadline(), now + frame, end);
        tokio::time::sleep_until(clock.instant_at(wake)).await;

        let ticks = view.pump();
        if ticks > 0 {
            debug!("generator: driver applied ticks={ticks}");
        }
        applied += ticks;
        on_frame(view);
    }

    applied
}

/// Same loop against a virtual clock, advancing straight to each wake-up
/// instead of waiting.
pub fn simulate<S, F>(
    view: &mut SessionView<ManualClock, S>,
    run_for: Duration,
    frame: Duration,
    mut on_frame: F,
) -> usize
where
    S: Scheduler,
    F: FnMut(&mut SessionView<ManualClock, S>),
{
    let frame = frame.max(MIN_FRAME);
    let clock = view.clock().clone();
    let end = clock.now() + run_for;
    let mut applied = 0;

    loop {
        let now = clock.now();
        if now >= end || !view.is_mounted() {
            break;
        }
        clock.advance_to(next_wake(view.next_deadline(), now + frame, end));

        applied += view.pump();
        on_frame(view);
    }

    applied
}

fn next_wake(deadline: Option<Duration>, next_frame: Duration, end: Duration) -> Duration {
    deadline
        .map_or(next_frame, |deadline| deadline.min(next_frame))
        .min(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GeneratorConfig, scheduler::TimerQueue, view::ToggleOutcome};

    fn seeded() -> GeneratorConfig {
        GeneratorConfig {
            seed: Some(5),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn wake_prefers_the_earliest_event() {
        let s = Duration::from_secs;
        assert_eq!(next_wake(Some(s(5)), s(1), s(30)), s(1));
        assert_eq!(next_wake(Some(s(5)), s(6), s(30)), s(5));
        assert_eq!(next_wake(None, s(6), s(3)), s(3));
    }

    #[tokio::test(start_paused = true)]
    async fn drives_ticks_on_real_time() {
        let clock = TokioClock::new();
        let mut view = SessionView::mount(&seeded(), clock, TimerQueue::new(clock));
        assert_eq!(view.toggle(true), ToggleOutcome::Started);

        let mut frames = 0;
        let applied = drive(
            &mut view,
            Duration::from_secs(27),
            Duration::from_secs(1),
            |_| frames += 1,
        )
        .await;

        assert_eq!(applied, 5);
        assert!(frames >= 25);
        assert!(view.snapshot().total_generated_mb <= 2.5);
    }

    #[tokio::test(start_paused = true)]
    async fn frame_callback_can_stop_the_session() {
        let clock = TokioClock::new();
        let mut view = SessionView::mount(&seeded(), clock, TimerQueue::new(clock));
        view.toggle(true);

        let applied = drive(
            &mut view,
            Duration::from_secs(60),
            Duration::from_millis(500),
            |view| {
                if view.clock().now() >= Duration::from_secs(12) {
                    view.toggle(false);
                }
            },
        )
        .await;

        assert_eq!(applied, 2);
        assert_eq!(view.live_tick_handles(), 0);
    }

    #[test]
    fn simulation_matches_tick_schedule() {
        let clock = ManualClock::new();
        let mut view =
            SessionView::mount(&seeded(), clock.clone(), TimerQueue::new(clock.clone()));
        view.toggle(true);

        let applied = simulate(
            &mut view,
            Duration::from_secs(25),
            Duration::from_millis(250),
            |_| {},
        );

        assert_eq!(applied, 5);
        assert_eq!(clock.now(), Duration::from_secs(25));
    }
}
