use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use generator_core::{
    driver, load_settings_from, Clock, ManualClock, Scheduler, SessionView, TimerQueue,
    TokioClock, ToggleOutcome,
};
use serde::Serialize;
use shared::domain::{DataStats, SessionSnapshot, SessionSummary};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BAR_WIDTH: usize = 24;

/// Runs a data generator session in the terminal.
#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./generator.toml or $GENERATOR_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 30)]
    run_for_secs: u64,
    /// Pause the generator after this many seconds.
    #[arg(long)]
    toggle_off_after_secs: Option<u64>,
    /// Report the screen as hidden from this second on.
    #[arg(long)]
    hide_at_secs: Option<u64>,
    #[arg(long)]
    show_at_secs: Option<u64>,
    /// Use a virtual clock and skip the waiting.
    #[arg(long)]
    simulate: bool,
    #[arg(long, default_value_t = 250)]
    frame_ms: u64,
    /// One JSON object per rendered frame instead of the status line.
    #[arg(long)]
    json: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Plan {
    toggle_off_at: Option<Duration>,
    hide_at: Option<Duration>,
    show_at: Option<Duration>,
}

impl Plan {
    fn from_args(args: &Args) -> Self {
        Self {
            toggle_off_at: args.toggle_off_after_secs.map(Duration::from_secs),
            hide_at: args.hide_at_secs.map(Duration::from_secs),
            show_at: args.show_at_secs.map(Duration::from_secs),
        }
    }

    fn apply<C: Clock, S: Scheduler>(
        &mut self,
        view: &mut SessionView<C, S>,
        renderer: &mut Renderer,
    ) {
        let now = view.clock().now();
        if self.hide_at.is_some_and(|at| now >= at) {
            self.hide_at = None;
            view.set_visible(false);
        }
        if self.show_at.is_some_and(|at| now >= at) {
            self.show_at = None;
            view.set_visible(true);
        }
        if self.toggle_off_at.is_some_and(|at| now >= at) {
            self.toggle_off_at = None;
            if let ToggleOutcome::Paused(summary) = view.toggle(false) {
                renderer.summary(&summary);
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    elapsed_ms: u128,
    #[serde(flatten)]
    snapshot: SessionSnapshot,
    progress: f64,
    pulse_scale: f64,
    visible: bool,
}

/// Prints a frame only when what it shows has changed.
struct Renderer {
    json: bool,
    last_line: Option<String>,
    failure: Option<anyhow::Error>,
}

impl Renderer {
    fn new(json: bool) -> Self {
        Self {
            json,
            last_line: None,
            failure: None,
        }
    }

    fn frame<C: Clock, S: Scheduler>(&mut self, view: &SessionView<C, S>) {
        let line = if self.json {
            let record = FrameRecord {
                elapsed_ms: view.clock().now().as_millis(),
                snapshot: view.snapshot(),
                progress: round_to(view.progress(), 3),
                pulse_scale: round_to(view.pulse_scale(), 3),
                visible: view.is_visible(),
            };
            match serde_json::to_string(&record) {
                Ok(line) => line,
                Err(err) => {
                    self.failure.get_or_insert(err.into());
                    return;
                }
            }
        } else {
            render_status_line(
                view.snapshot(),
                view.progress(),
                view.pulse_scale(),
                view.status_text(),
            )
        };

        let changed = if self.json {
            self.last_line.as_deref().map(strip_elapsed) != Some(strip_elapsed(&line))
        } else {
            self.last_line.as_deref() != Some(line.as_str())
        };
        if changed {
            println!("{line}");
            self.last_line = Some(line);
        }
    }

    fn summary(&self, summary: &SessionSummary) {
        println!("{}: {}", summary.title(), summary.message());
    }

    fn finish(self) -> Result<()> {
        match self.failure {
            Some(err) => Err(err.context("failed to render frame")),
            None => Ok(()),
        }
    }
}

fn strip_elapsed(line: &str) -> &str {
    line.split_once(',').map_or(line, |(_, rest)| rest)
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn render_progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn render_status_line(
    snapshot: SessionSnapshot,
    progress: f64,
    pulse_scale: f64,
    status: &str,
) -> String {
    let badge = if snapshot.state.is_active() {
        format!("ACTIVE x{pulse_scale:.1}")
    } else {
        "idle".to_string()
    };
    format!(
        "{:<10} {} {:.2} MB generated | {}",
        badge,
        render_progress_bar(progress, BAR_WIDTH),
        snapshot.total_generated_mb,
        status
    )
}

fn render_stats(stats: DataStats) -> String {
    format!(
        "Your Data Stats: {:.2} MB Generated | {} MB Used | {:.2} MB Available",
        stats.generated_mb, stats.used_mb, stats.available_mb
    )
}

fn close_session<C: Clock, S: Scheduler>(view: &mut SessionView<C, S>, renderer: &Renderer) {
    if let ToggleOutcome::Paused(summary) = view.toggle(false) {
        renderer.summary(&summary);
    }
    println!("{}", render_stats(view.data_stats()));
    view.unmount();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings =
        load_settings_from(args.config.as_deref()).context("failed to load generator settings")?;
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    let config = settings
        .validate()
        .context("invalid generator settings")?;

    let run_for = Duration::from_secs(args.run_for_secs);
    let frame = Duration::from_millis(args.frame_ms);
    let mut plan = Plan::from_args(&args);
    let mut renderer = Renderer::new(args.json);

    let ticks = if args.simulate {
        let clock = ManualClock::new();
        let mut view = SessionView::mount(&config, clock.clone(), TimerQueue::new(clock));
        view.toggle(true);
        renderer.frame(&view);
        let ticks = driver::simulate(&mut view, run_for, frame, |view| {
            plan.apply(view, &mut renderer);
            renderer.frame(view);
        });
        close_session(&mut view, &renderer);
        ticks
    } else {
        let clock = TokioClock::new();
        let mut view = SessionView::mount(&config, clock, TimerQueue::new(clock));
        view.toggle(true);
        renderer.frame(&view);
        let ticks = driver::drive(&mut view, run_for, frame, |view| {
            plan.apply(view, &mut renderer);
            renderer.frame(view);
        })
        .await;
        close_session(&mut view, &renderer);
        ticks
    };

    info!("generator: run finished ticks={ticks}");
    renderer.finish()
}
