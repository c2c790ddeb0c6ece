//! Booking store ports (write side).
//!
//! Every state-changing operation runs inside one `BookingTransaction`
//! obtained from a `BookingUnitOfWork`. Rows read through a `*_for_update`
//! method stay write-locked until the transaction commits or is dropped.
//!
//! # Design
//!
//! - **Transaction-scoped**: stores are views over an open transaction
//! - **Rollback on drop**: an uncommitted transaction discards its writes
//! - **Locks before counts**: capacity is derived under the session lock

use crate::domain::credits::MemberCredit;
use crate::domain::foundation::{
    DomainError, EmployeeId, MemberId, PaymentId, ReservationId, ServiceId, SessionId, Timestamp,
};
use crate::domain::payment::Payment;
use crate::domain::reservation::Reservation;
use crate::domain::scheduling::{Session, TimeWindow};
use async_trait::async_trait;

/// Session rows inside a transaction.
#[async_trait]
pub trait SessionStore: Send {
    /// Load a session and hold its write lock.
    async fn find_session_for_update(
        &mut self,
        id: &SessionId,
    ) -> Result<Option<Session>, DomainError>;

    /// Load a session without locking it.
    ///
    /// For reading fields that never change, such as the service.
    async fn find_session(&mut self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Serialize schedule writes for one trainer until commit.
    async fn lock_trainer_schedule(&mut self, trainer_id: &EmployeeId) -> Result<(), DomainError>;

    /// True if another scheduled session of the trainer overlaps `window`.
    ///
    /// Cancelled sessions never count; `exclude` skips the session being
    /// rescheduled.
    async fn exists_trainer_overlap(
        &mut self,
        trainer_id: &EmployeeId,
        window: &TimeWindow,
        exclude: Option<&SessionId>,
    ) -> Result<bool, DomainError>;

    /// # Errors
    ///
    /// - `TrainerOverlap` if the exclusion constraint rejects the row
    async fn insert_session(&mut self, session: &Session) -> Result<(), DomainError>;

    async fn update_session(&mut self, session: &Session) -> Result<(), DomainError>;
}

/// Reservation rows inside a transaction.
#[async_trait]
pub trait ReservationStore: Send {
    async fn find_reservation_for_update(
        &mut self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, DomainError>;

    async fn has_active_reservation(
        &mut self,
        member_id: &MemberId,
        session_id: &SessionId,
    ) -> Result<bool, DomainError>;

    /// Active reservations of a session. Callers hold the session lock.
    async fn count_active_reservations(&mut self, session_id: &SessionId)
        -> Result<i64, DomainError>;

    /// Active reservations of a session, locked for update.
    async fn active_reservations_for_session(
        &mut self,
        session_id: &SessionId,
    ) -> Result<Vec<Reservation>, DomainError>;

    /// # Errors
    ///
    /// - `AlreadyBooked` if the member already holds an active reservation
    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), DomainError>;

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), DomainError>;
}

/// Credit balance rows inside a transaction.
#[async_trait]
pub trait CreditStore: Send {
    /// Get-or-create the balance row and hold its write lock.
    ///
    /// Concurrent callers for the same pair converge on one row.
    async fn lock_credit(
        &mut self,
        member_id: &MemberId,
        service_id: &ServiceId,
    ) -> Result<MemberCredit, DomainError>;

    async fn save_credit(&mut self, credit: &MemberCredit) -> Result<(), DomainError>;
}

/// Payment rows inside a transaction.
#[async_trait]
pub trait PaymentStore: Send {
    async fn find_payment_for_update(
        &mut self,
        id: &PaymentId,
    ) -> Result<Option<Payment>, DomainError>;

    async fn find_payment_by_external_ref_for_update(
        &mut self,
        external_ref: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// True if a payment other than `exclude` carries this reference.
    async fn external_ref_taken(
        &mut self,
        external_ref: &str,
        exclude: &PaymentId,
    ) -> Result<bool, DomainError>;

    /// Pending payments created before `cutoff`, locked for update.
    async fn stale_payments_for_update(
        &mut self,
        cutoff: &Timestamp,
    ) -> Result<Vec<Payment>, DomainError>;

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `DuplicateExternalRef` if the reference belongs to another payment
    async fn update_payment(&mut self, payment: &Payment) -> Result<(), DomainError>;
}

/// One open unit of work over every booking store.
#[async_trait]
pub trait BookingTransaction: SessionStore + ReservationStore + CreditStore + PaymentStore {
    /// Make every write visible and release all locks.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}

/// Factory for booking transactions.
#[async_trait]
pub trait BookingUnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_transaction_is_object_safe() {
        fn _accepts_dyn(_tx: &dyn BookingTransaction) {}
    }

    #[test]
    fn booking_unit_of_work_is_object_safe() {
        fn _accepts_dyn(_uow: &dyn BookingUnitOfWork) {}
    }
}
