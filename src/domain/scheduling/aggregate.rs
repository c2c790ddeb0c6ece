//! Session aggregate entity.
//!
//! A session is one capacity-bounded occurrence of a fitness service, taught
//! by a trainer at a location.
//!
//! # Design Decisions
//!
//! - **No booking counter**: the active reservation count is always derived
//!   from the reservation table under the session lock
//! - **Half-open windows**: `[starts_at, ends_at)`, so back-to-back sessions
//!   of one trainer do not overlap
//! - **Soft lifecycle**: sessions are cancelled, never deleted

use crate::domain::foundation::{
    DomainError, EmployeeId, ErrorCode, LocationId, ServiceId, SessionId, StateMachine, Timestamp,
    ValidationError,
};
use serde::{Deserialize, Serialize};

use super::SessionStatus;

/// Largest capacity accepted for a single session.
pub const MAX_SESSION_CAPACITY: i32 = 500;

/// Half-open time interval `[starts_at, ends_at)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    starts_at: Timestamp,
    ends_at: Timestamp,
}

impl TimeWindow {
    /// Creates a window, rejecting `ends_at <= starts_at`.
    pub fn new(starts_at: Timestamp, ends_at: Timestamp) -> Result<Self, ValidationError> {
        if !ends_at.is_after(&starts_at) {
            return Err(ValidationError::invalid_format(
                "ends_at",
                "end time must be after start time",
            ));
        }
        Ok(Self { starts_at, ends_at })
    }

    pub fn starts_at(&self) -> Timestamp {
        self.starts_at
    }

    pub fn ends_at(&self) -> Timestamp {
        self.ends_at
    }

    /// `self.start < other.end AND self.end > other.start`
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.starts_at.is_before(&other.ends_at) && self.ends_at.is_after(&other.starts_at)
    }
}

/// Session aggregate.
///
/// # Invariants
///
/// - `ends_at` is strictly after `starts_at`
/// - `1 <= capacity <= MAX_SESSION_CAPACITY`
/// - Status transitions follow the state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub location_id: LocationId,
    pub service_id: ServiceId,
    pub trainer_id: EmployeeId,
    pub window: TimeWindow,
    pub capacity: i32,
    pub status: SessionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Session {
    /// Schedule a new session.
    pub fn schedule(
        id: SessionId,
        location_id: LocationId,
        service_id: ServiceId,
        trainer_id: EmployeeId,
        window: TimeWindow,
        capacity: i32,
    ) -> Result<Self, ValidationError> {
        validate_capacity(capacity)?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            location_id,
            service_id,
            trainer_id,
            window,
            capacity,
            status: SessionStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_bookable(&self) -> bool {
        self.status.is_bookable()
    }

    /// Move the session to a new window, capacity, and trainer.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session is cancelled
    /// - `ValidationFailed` if capacity is out of range
    pub fn reschedule(
        &mut self,
        window: TimeWindow,
        capacity: i32,
        trainer_id: EmployeeId,
    ) -> Result<(), DomainError> {
        if !self.is_bookable() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot reschedule session in {} state", self.status),
            ));
        }
        validate_capacity(capacity)?;
        self.window = window;
        self.capacity = capacity;
        self.trainer_id = trainer_id;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Cancel the session.
    ///
    /// Returns `false` if it was already cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.status.transition_to(SessionStatus::Cancelled) {
            Ok(next) => {
                self.status = next;
                self.updated_at = Timestamp::now();
                true
            }
            Err(_) => false,
        }
    }

    /// Seats still free given the current active count.
    pub fn remaining_seats(&self, active_count: i64) -> i64 {
        (self.capacity as i64 - active_count).max(0)
    }
}

fn validate_capacity(capacity: i32) -> Result<(), ValidationError> {
    if !(1..=MAX_SESSION_CAPACITY).contains(&capacity) {
        return Err(ValidationError::out_of_range(
            "capacity",
            1,
            MAX_SESSION_CAPACITY as i64,
            capacity as i64,
        ));
    }
    Ok(())
}
