//! Booking reader port (read side).
//!
//! Lock-free queries for listings and detail views. Results may trail a
//! concurrent transaction by one commit.

use crate::domain::credits::MemberCredit;
use crate::domain::foundation::{
    DomainError, MemberId, PaymentId, ReservationId, ServiceId, SessionId,
};
use crate::domain::payment::Payment;
use crate::domain::reservation::Reservation;
use crate::domain::scheduling::Session;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

/// Reader port for booking queries.
#[async_trait]
pub trait BookingReader: Send + Sync {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Scheduled sessions ordered by start time, with active booking counts.
    async fn list_available_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<Vec<SessionAvailability>, DomainError>;

    async fn get_reservation(&self, id: &ReservationId)
        -> Result<Option<Reservation>, DomainError>;

    /// All reservations, newest first.
    async fn list_reservations(&self) -> Result<Vec<Reservation>, DomainError>;

    /// Reservations of a member, newest first.
    async fn list_reservations_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<Reservation>, DomainError>;

    /// Credit balances of a member across services.
    async fn list_credits_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<MemberCredit>, DomainError>;

    async fn get_payment(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    async fn find_payment_by_external_ref(
        &self,
        external_ref: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Payments newest first, optionally for one member.
    async fn list_payments(&self, member_id: Option<&MemberId>)
        -> Result<Vec<Payment>, DomainError>;
}

/// Filter for available-session listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub service_id: Option<ServiceId>,
    /// UTC calendar day the session starts on.
    pub date: Option<NaiveDate>,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        self.service_id.map_or(true, |s| s == session.service_id)
            && self
                .date
                .map_or(true, |d| session.window.starts_at().date() == d)
    }
}

/// A scheduled session with its current booking count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionAvailability {
    pub session: Session,
    pub active_count: i64,
}
