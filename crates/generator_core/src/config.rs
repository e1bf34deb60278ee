use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::error::GeneratorError;

pub const TICK_PERIOD: Duration = Duration::from_millis(5_000);
pub const MAX_INCREMENT_MB: f64 = 0.5;
pub const ACTIVATE_DURATION: Duration = Duration::from_millis(1_000);
pub const DEACTIVATE_DURATION: Duration = Duration::from_millis(500);
pub const FADE_IN_DURATION: Duration = Duration::from_millis(500);
pub const PULSE_LEG_DURATION: Duration = Duration::from_millis(1_000);
pub const PULSE_PEAK_SCALE: f64 = 1.2;

const DEFAULT_CONFIG_FILE: &str = "generator.toml";

/// Raw, unvalidated settings as read from file and environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub tick_period_ms: u64,
    pub max_increment_mb: f64,
    pub activate_ms: u64,
    pub deactivate_ms: u64,
    pub initial_total_mb: f64,
    pub pause_when_hidden: bool,
    pub seed: Option<u64>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            tick_period_ms: TICK_PERIOD.as_millis() as u64,
            max_increment_mb: MAX_INCREMENT_MB,
            activate_ms: ACTIVATE_DURATION.as_millis() as u64,
            deactivate_ms: DEACTIVATE_DURATION.as_millis() as u64,
            initial_total_mb: 0.0,
            pause_when_hidden: false,
            seed: None,
        }
    }
}

/// Validated configuration handed to a session on mount.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub tick_period: Duration,
    pub max_increment_mb: f64,
    pub activate_duration: Duration,
    pub deactivate_duration: Duration,
    pub initial_total_mb: f64,
    pub pause_when_hidden: bool,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tick_period: TICK_PERIOD,
            max_increment_mb: MAX_INCREMENT_MB,
            activate_duration: ACTIVATE_DURATION,
            deactivate_duration: DEACTIVATE_DURATION,
            initial_total_mb: 0.0,
            pause_when_hidden: false,
            seed: None,
        }
    }
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<GeneratorConfig, GeneratorError> {
        if self.tick_period_ms == 0 {
            return Err(GeneratorError::ZeroTickPeriod);
        }
        if self.activate_ms == 0 {
            return Err(GeneratorError::ZeroDuration { name: "activate" });
        }
        if self.deactivate_ms == 0 {
            return Err(GeneratorError::ZeroDuration { name: "deactivate" });
        }
        if !self.max_increment_mb.is_finite() || self.max_increment_mb <= 0.0 {
            return Err(GeneratorError::InvalidMaxIncrement(self.max_increment_mb));
        }
        if !self.initial_total_mb.is_finite() || self.initial_total_mb < 0.0 {
            return Err(GeneratorError::InvalidInitialTotal(self.initial_total_mb));
        }

        Ok(GeneratorConfig {
            tick_period: Duration::from_millis(self.tick_period_ms),
            max_increment_mb: self.max_increment_mb,
            activate_duration: Duration::from_millis(self.activate_ms),
            deactivate_duration: Duration::from_millis(self.deactivate_ms),
            initial_total_mb: self.initial_total_mb,
            pause_when_hidden: self.pause_when_hidden,
            seed: self.seed,
        })
    }
}

/// Defaults, then `generator.toml` (or the file named by `GENERATOR_CONFIG`),
/// then environment overrides. An explicitly named file that cannot be read
/// or parsed is an error; a missing default file is not.
pub fn load_settings() -> Result<GeneratorSettings, GeneratorError> {
    let explicit = std::env::var("GENERATOR_CONFIG").ok();
    load_settings_from(explicit.as_deref().map(Path::new))
}

/// Like [`load_settings`] but with the config file chosen by the caller.
pub fn load_settings_from(path: Option<&Path>) -> Result<GeneratorSettings, GeneratorError> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => match fs::read_to_string(DEFAULT_CONFIG_FILE) {
            Ok(raw) => parse_settings(DEFAULT_CONFIG_FILE, &raw)?,
            Err(_) => GeneratorSettings::default(),
        },
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn read_settings_file(path: &Path) -> Result<GeneratorSettings, GeneratorError> {
    let raw = fs::read_to_string(path).map_err(|err| GeneratorError::ConfigFile {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    parse_settings(&path.display().to_string(), &raw)
}

fn parse_settings(path: &str, raw: &str) -> Result<GeneratorSettings, GeneratorError> {
    toml::from_str::<GeneratorSettings>(raw).map_err(|err| GeneratorError::ConfigFile {
        path: path.to_string(),
        message: err.to_string(),
    })
}

fn lookup(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    env(&format!("APP__{name}")).or_else(|| env(name))
}

pub(crate) fn apply_env_overrides(
    settings: &mut GeneratorSettings,
    env: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup(&env, "GENERATOR_TICK_PERIOD_MS").and_then(|v| v.parse().ok()) {
        settings.tick_period_ms = v;
    }
    if let Some(v) = lookup(&env, "GENERATOR_MAX_INCREMENT_MB").and_then(|v| v.parse().ok()) {
        settings.max_increment_mb = v;
    }
    if let Some(v) = lookup(&env, "GENERATOR_ACTIVATE_MS").and_then(|v| v.parse().ok()) {
        settings.activate_ms = v;
    }
    if let Some(v) = lookup(&env, "GENERATOR_DEACTIVATE_MS").and_then(|v| v.parse().ok()) {
        settings.deactivate_ms = v;
    }
    if let Some(v) = lookup(&env, "GENERATOR_INITIAL_TOTAL_MB").and_then(|v| v.parse().ok()) {
        settings.initial_total_mb = v;
    }
    if let Some(v) = lookup(&env, "GENERATOR_PAUSE_WHEN_HIDDEN").and_then(|v| parse_flag(&v)) {
        settings.pause_when_hidden = v;
    }
    if let Some(v) = lookup(&env, "GENERATOR_SEED").and_then(|v| v.parse().ok()) {
        settings.seed = Some(v);
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
