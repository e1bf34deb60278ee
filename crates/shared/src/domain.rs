use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(TickHandle);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Active,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        self == SessionState::Active
    }
}

/// Resting point of the progress indicator for a given session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTarget {
    Empty,
    Full,
}

impl ProgressTarget {
    pub fn value(self) -> f64 {
        match self {
            ProgressTarget::Empty => 0.0,
            ProgressTarget::Full => 1.0,
        }
    }
}

impl From<SessionState> for ProgressTarget {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Idle => ProgressTarget::Empty,
            SessionState::Active => ProgressTarget::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub total_generated_mb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_generated_mb: f64,
}

impl SessionSummary {
    pub fn title(&self) -> &'static str {
        "Generator Paused"
    }

    pub fn message(&self) -> String {
        format!(
            "You've generated {:.2} MB of data during this session.",
            self.total_generated_mb
        )
    }
}

/// Figures shown on the "Your Data Stats" card. Nothing is ever consumed, so
/// everything generated stays available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataStats {
    pub generated_mb: f64,
    pub used_mb: f64,
    pub available_mb: f64,
}

impl DataStats {
    pub fn from_total(total_generated_mb: f64) -> Self {
        Self {
            generated_mb: total_generated_mb,
            used_mb: 0.0,
            available_mb: total_generated_mb,
        }
    }
}
