//! Reservation status state machine.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Reservation lifecycle.
///
/// `Active` counts toward session capacity. It is persisted as `confirmed`;
/// rows written as `created` by older clients read back as `Active` too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

impl ReservationStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Active)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the storage representation, accepting legacy spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "confirmed" | "created" | "active" => Some(ReservationStatus::Active),
            "cancelled" | "canceled" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }
}

impl StateMachine for ReservationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (ReservationStatus::Active, ReservationStatus::Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ReservationStatus::Active => vec![ReservationStatus::Cancelled],
            ReservationStatus::Cancelled => vec![],
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
