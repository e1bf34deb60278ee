//! Simulated data generation session: the toggle-driven start/stop state
//! machine, its repeating tick timer, and the progress animations that follow it.

pub mod animator;
pub mod clock;
pub mod config;
pub mod controller;
pub mod driver;
pub mod scheduler;
pub mod view;

pub use animator::{ease_in_out, ProgressAnimator, PulseAnimator, Tween};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{load_settings, load_settings_from, GeneratorConfig, GeneratorSettings};
pub use controller::GenerationController;
pub use scheduler::{Scheduler, TimerQueue};
pub use view::{SessionView, ToggleOutcome};
