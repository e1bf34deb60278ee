use serde::{Deserialize, Serialize};

use crate::domain::{SessionSnapshot, SessionSummary};

/// Notifications published by a generation session for re-rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    TotalChanged(SessionSnapshot),
    Paused(SessionSummary),
}

impl SessionEvent {
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        match self {
            SessionEvent::StateChanged(snapshot) | SessionEvent::TotalChanged(snapshot) => {
                Some(*snapshot)
            }
            SessionEvent::Paused(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionState;

    #[test]
    fn events_are_tagged_on_the_wire() {
        let event = SessionEvent::Paused(SessionSummary {
            total_generated_mb: 2.0,
        });
        let json = serde_json::to_value(&event).expect("json");
        assert_eq!(json["type"], "paused");
        assert_eq!(json["payload"]["total_generated_mb"], 2.0);
        assert!(event.snapshot().is_none());

        let changed = SessionEvent::TotalChanged(SessionSnapshot {
            state: SessionState::Active,
            total_generated_mb: 0.3,
        });
        assert_eq!(changed.snapshot().map(|s| s.total_generated_mb), Some(0.3));
    }
}
