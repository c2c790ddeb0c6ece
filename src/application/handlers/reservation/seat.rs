//! Seat reservation shared by the member and staff booking paths.

use crate::application::ledger::CreditLedger;
use crate::domain::foundation::{
    BookingError, ConflictReason, MemberId, PaymentId, ReservationId, ServiceId, SessionId,
};
use crate::domain::reservation::Reservation;
use crate::domain::scheduling::Session;
use crate::ports::{BookingTransaction, PaymentStore, ReservationStore, SessionStore};

/// A reservation written inside an open transaction.
pub(super) struct Seat {
    pub reservation: Reservation,
    pub session: Session,
    pub current_bookings: i64,
    pub remaining_credits: i32,
}

/// Lock a session row that can still take bookings.
pub(super) async fn lock_session(
    tx: &mut dyn BookingTransaction,
    session_id: &SessionId,
) -> Result<Session, BookingError> {
    let session = tx
        .find_session_for_update(session_id)
        .await?
        .ok_or_else(|| BookingError::not_found("session", session_id))?;

    if !session.is_bookable() {
        return Err(BookingError::invalid_state(
            session.status.as_str(),
            "book session",
        ));
    }
    Ok(session)
}

/// Check that a payment may back a reservation: it belongs to the member,
/// covers the session's service and has been paid.
pub(super) async fn check_attached_payment(
    tx: &mut dyn BookingTransaction,
    payment_id: &PaymentId,
    member_id: &MemberId,
    service_id: &ServiceId,
) -> Result<(), BookingError> {
    let payment = tx
        .find_payment_for_update(payment_id)
        .await?
        .ok_or_else(|| BookingError::not_found("payment", payment_id))?;
    if payment.member_id != *member_id {
        return Err(BookingError::invalid_argument(
            "payment_id",
            "Payment does not belong to member",
        ));
    }
    if payment.service_id != *service_id {
        return Err(BookingError::invalid_argument(
            "payment_id",
            "Payment service does not match session service",
        ));
    }
    if !payment.is_paid() {
        return Err(BookingError::conflict(ConflictReason::PaymentNotPaid));
    }
    Ok(())
}

/// Take a seat on a session the transaction has already locked.
///
/// The credit is consumed before the row is inserted; a rollback undoes both.
pub(super) async fn reserve_seat(
    tx: &mut dyn BookingTransaction,
    session: Session,
    member_id: &MemberId,
    payment_id: Option<PaymentId>,
    note: Option<String>,
) -> Result<Seat, BookingError> {
    if tx.has_active_reservation(member_id, &session.id).await? {
        return Err(BookingError::conflict(ConflictReason::AlreadyBooked));
    }

    let active = tx.count_active_reservations(&session.id).await?;
    if active >= session.capacity as i64 {
        return Err(BookingError::conflict(ConflictReason::SessionFull));
    }

    let reservation =
        Reservation::book(ReservationId::new(), *member_id, session.id, payment_id, note)?;
    let credit = CreditLedger::consume(&mut *tx, member_id, &session.service_id, 1).await?;
    tx.insert_reservation(&reservation).await?;

    Ok(Seat {
        reservation,
        session,
        current_bookings: active + 1,
        remaining_credits: credit.available_credits,
    })
}
