//! Reservation aggregate entity.
//!
//! A reservation is a member's claim on one seat of a session. It only ever
//! moves forward (active to cancelled) and records whether it consumed a
//! credit, which decides whether cancelling refunds one.

use crate::domain::foundation::{
    MemberId, PaymentId, ReservationId, SessionId, StateMachine, Timestamp, ValidationError,
};
use serde::{Deserialize, Serialize};

use super::ReservationStatus;

/// Longest note accepted on a reservation.
pub const MAX_NOTE_LENGTH: usize = 200;

/// Outcome of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Reservation was already cancelled; nothing changed.
    AlreadyCancelled,
    /// Reservation moved to cancelled.
    Cancelled { refund_credit: bool },
}

/// Reservation aggregate.
///
/// # Invariants
///
/// - At most one active reservation per `(member_id, session_id)`
/// - `cancelled_at` is set iff status is `Cancelled`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub member_id: MemberId,
    pub session_id: SessionId,
    pub payment_id: Option<PaymentId>,
    pub status: ReservationStatus,
    pub note: Option<String>,
    pub credit_consumed: bool,
    pub created_at: Timestamp,
    pub cancelled_at: Option<Timestamp>,
}

impl Reservation {
    /// Create an active reservation backed by one consumed credit.
    pub fn book(
        id: ReservationId,
        member_id: MemberId,
        session_id: SessionId,
        payment_id: Option<PaymentId>,
        note: Option<String>,
    ) -> Result<Self, ValidationError> {
        let note = normalize_note(note)?;
        Ok(Self {
            id,
            member_id,
            session_id,
            payment_id,
            status: ReservationStatus::Active,
            note,
            credit_consumed: true,
            created_at: Timestamp::now(),
            cancelled_at: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Replace the note and attached payment.
    ///
    /// Member, session and status never change here; status moves only
    /// through [`Reservation::cancel`].
    pub fn amend(
        &mut self,
        payment_id: Option<PaymentId>,
        note: Option<String>,
    ) -> Result<(), ValidationError> {
        self.note = normalize_note(note)?;
        self.payment_id = payment_id;
        Ok(())
    }

    /// Cancel this reservation.
    ///
    /// Cancelling twice is a no-op. A refund is due only when this
    /// reservation consumed a credit.
    pub fn cancel(&mut self) -> CancelOutcome {
        match self.status.transition_to(ReservationStatus::Cancelled) {
            Ok(next) => {
                self.status = next;
                self.cancelled_at = Some(Timestamp::now());
                CancelOutcome::Cancelled {
                    refund_credit: self.credit_consumed,
                }
            }
            Err(_) => CancelOutcome::AlreadyCancelled,
        }
    }
}

fn normalize_note(note: Option<String>) -> Result<Option<String>, ValidationError> {
    let note = note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(n) = &note {
        let len = n.chars().count();
        if len > MAX_NOTE_LENGTH {
            return Err(ValidationError::out_of_range(
                "note",
                0,
                MAX_NOTE_LENGTH as i64,
                len as i64,
            ));
        }
    }
    Ok(note)
}
