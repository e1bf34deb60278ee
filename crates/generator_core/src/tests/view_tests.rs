use super::*;
use crate::{clock::ManualClock, scheduler::TimerQueue};

const TICK: Duration = Duration::from_secs(5);

type TestView = SessionView<ManualClock, TimerQueue<ManualClock>>;

fn mount(config: GeneratorConfig) -> (ManualClock, TestView) {
    let clock = ManualClock::new();
    let view = SessionView::mount(&config, clock.clone(), TimerQueue::new(clock.clone()));
    (clock, view)
}

fn seeded() -> GeneratorConfig {
    GeneratorConfig {
        seed: Some(11),
        ..GeneratorConfig::default()
    }
}

#[test]
fn mounts_idle_and_fades_in() {
    let (clock, view) = mount(seeded());
    assert_eq!(view.state(), SessionState::Idle);
    assert_eq!(view.snapshot().total_generated_mb, 0.0);
    assert_eq!(view.content_opacity(), 0.0);
    assert_eq!(view.status_text(), IDLE_STATUS);
    assert_eq!(view.toggle_subtitle(), IDLE_SUBTITLE);

    clock.advance(FADE_IN_DURATION);
    assert_eq!(view.content_opacity(), 1.0);
}

#[test]
fn toggle_drives_timer_and_animations_together() {
    let (clock, mut view) = mount(seeded());

    assert_eq!(view.toggle(true), ToggleOutcome::Started);
    assert_eq!(view.progress_target(), ProgressTarget::Full);
    assert_eq!(view.live_tick_handles(), 1);
    assert_eq!(view.status_text(), ACTIVE_STATUS);
    assert_eq!(view.toggle_subtitle(), ACTIVE_SUBTITLE);

    clock.advance(Duration::from_millis(1_000));
    assert!((view.progress() - 1.0).abs() < 1e-9);
    assert!(view.pulse_scale() > 1.0);

    let outcome = view.toggle(false);
    assert!(matches!(outcome, ToggleOutcome::Paused(_)));
    assert_eq!(view.progress_target(), ProgressTarget::Empty);
    assert_eq!(view.live_tick_handles(), 0);
    assert_eq!(view.pulse_scale(), 1.0);

    clock.advance(Duration::from_millis(500));
    assert!(view.progress().abs() < 1e-9);
}

#[test]
fn repeated_toggles_report_noops() {
    let (_clock, mut view) = mount(seeded());
    assert_eq!(view.toggle(false), ToggleOutcome::AlreadyIdle);
    assert_eq!(view.toggle(true), ToggleOutcome::Started);
    assert_eq!(view.toggle(true), ToggleOutcome::AlreadyActive);
    assert_eq!(view.live_tick_handles(), 1);
}

#[test]
fn pause_summary_matches_accumulated_total() {
    let (clock, mut view) = mount(seeded());
    view.toggle(true);
    for _ in 0..3 {
        clock.advance(TICK);
        assert_eq!(view.pump(), 1);
    }
    let total = view.snapshot().total_generated_mb;
    match view.toggle(false) {
        ToggleOutcome::Paused(summary) => {
            assert_eq!(summary.total_generated_mb, total);
            assert_eq!(view.data_stats(), DataStats::from_total(total));
        }
        other => panic!("expected pause summary, got {other:?}"),
    }
}

#[test]
fn unmount_while_active_prevents_further_ticks() {
    let (clock, mut view) = mount(seeded());
    view.toggle(true);
    clock.advance(TICK);
    view.pump();
    let before = view.snapshot().total_generated_mb;

    view.unmount();
    assert!(!view.is_mounted());
    assert_eq!(view.live_tick_handles(), 0);

    clock.advance(TICK * 10);
    assert_eq!(view.pump(), 0);
    assert_eq!(view.snapshot().total_generated_mb, before);
    assert_eq!(view.toggle(true), ToggleOutcome::Ignored);
    assert_eq!(view.live_tick_handles(), 0);
}

#[test]
fn unmount_does_not_publish_a_pause_summary() {
    let (_clock, mut view) = mount(seeded());
    let mut events = view.subscribe_events();
    view.toggle(true);
    view.unmount();

    let mut saw_pause = false;
    while let Ok(event) = events.try_recv() {
        saw_pause |= matches!(event, SessionEvent::Paused(_));
    }
    assert!(!saw_pause);
}

#[test]
fn hidden_view_keeps_generating_by_default() {
    let (clock, mut view) = mount(seeded());
    view.toggle(true);
    view.set_visible(false);
    assert!(!view.is_visible());
    assert_eq!(view.state(), SessionState::Active);

    clock.advance(TICK);
    assert_eq!(view.pump(), 1);
}

#[test]
fn hidden_view_pauses_when_configured() {
    let (clock, mut view) = mount(GeneratorConfig {
        pause_when_hidden: true,
        ..seeded()
    });
    let mut events = view.subscribe_events();
    view.toggle(true);

    view.set_visible(false);
    assert_eq!(view.state(), SessionState::Idle);
    assert_eq!(view.live_tick_handles(), 0);
    assert_eq!(view.progress_target(), ProgressTarget::Empty);
    clock.advance(TICK * 2);
    assert_eq!(view.pump(), 0);

    view.set_visible(true);
    assert_eq!(view.state(), SessionState::Active);
    assert_eq!(view.live_tick_handles(), 1);
    clock.advance(TICK);
    assert_eq!(view.pump(), 1);

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, SessionEvent::Paused(_)));
    }
}

#[test]
fn turning_off_while_hidden_cancels_the_resume() {
    let (_clock, mut view) = mount(GeneratorConfig {
        pause_when_hidden: true,
        ..seeded()
    });
    view.toggle(true);
    view.set_visible(false);
    assert_eq!(view.toggle(false), ToggleOutcome::AlreadyIdle);

    view.set_visible(true);
    assert_eq!(view.state(), SessionState::Idle);
    assert_eq!(view.live_tick_handles(), 0);
}

#[test]
fn progress_never_desyncs_from_state_under_rapid_toggling() {
    let (clock, mut view) = mount(seeded());
    for step in 0..40 {
        view.toggle(step % 3 != 0);
        clock.advance(Duration::from_millis(90));
        view.pump();
        assert_eq!(view.progress_target(), ProgressTarget::from(view.state()));
        assert_eq!(view.live_tick_handles(), usize::from(view.state().is_active()));
    }
}

#[test]
fn turning_on_while_hidden_waits_for_show() {
    let (clock, mut view) = mount(GeneratorConfig {
        pause_when_hidden: true,
        ..seeded()
    });
    view.set_visible(false);

    assert_eq!(view.toggle(true), ToggleOutcome::Deferred);
    assert_eq!(view.state(), SessionState::Idle);
    assert_eq!(view.live_tick_handles(), 0);
    assert_eq!(view.progress_target(), ProgressTarget::Empty);
    clock.advance(TICK);
    assert_eq!(view.pump(), 0);
    assert_eq!(view.snapshot().total_generated_mb, 0.0);

    view.set_visible(true);
    assert_eq!(view.state(), SessionState::Active);
    assert_eq!(view.live_tick_handles(), 1);
    clock.advance(TICK);
    assert_eq!(view.pump(), 1);
}

#[test]
fn deferred_start_can_be_withdrawn_while_hidden() {
    let (_clock, mut view) = mount(GeneratorConfig {
        pause_when_hidden: true,
        ..seeded()
    });
    view.set_visible(false);
    assert_eq!(view.toggle(true), ToggleOutcome::Deferred);
    assert_eq!(view.toggle(false), ToggleOutcome::AlreadyIdle);

    view.set_visible(true);
    assert_eq!(view.state(), SessionState::Idle);
    assert_eq!(view.live_tick_handles(), 0);
}
