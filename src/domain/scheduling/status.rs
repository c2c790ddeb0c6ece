//! Session status state machine.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle of a scheduled class session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Open for booking; counts toward trainer overlap checks.
    Scheduled,

    /// Called off. Terminal.
    Cancelled,
}

impl SessionStatus {
    /// Returns true if members can book seats.
    pub fn is_bookable(&self) -> bool {
        matches!(self, SessionStatus::Scheduled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (SessionStatus::Scheduled, SessionStatus::Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SessionStatus::Scheduled => vec![SessionStatus::Cancelled],
            SessionStatus::Cancelled => vec![],
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
