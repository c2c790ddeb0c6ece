//! CreateReservationHandler - Command handler for staff booking on behalf of
//! a member.
//!
//! Follows the member booking path. An attached payment is only checked, it
//! never re-issues credits; the reservation still consumes one.

use std::sync::Arc;

use super::seat::{check_attached_payment, lock_session, reserve_seat};
use crate::domain::foundation::{Actor, BookingError, MemberId, PaymentId, SessionId};
use crate::domain::reservation::Reservation;
use crate::ports::{BookingTransaction, BookingUnitOfWork, Directory};

#[derive(Debug, Clone)]
pub struct CreateReservationCommand {
    pub actor: Actor,
    pub member_id: MemberId,
    pub session_id: SessionId,
    pub payment_id: Option<PaymentId>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateReservationResult {
    pub reservation: Reservation,
    pub current_bookings: i64,
    pub remaining_credits: i32,
}

pub struct CreateReservationHandler {
    uow: Arc<dyn BookingUnitOfWork>,
    directory: Arc<dyn Directory>,
}

impl CreateReservationHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>, directory: Arc<dyn Directory>) -> Self {
        Self { uow, directory }
    }

    pub async fn handle(
        &self,
        cmd: CreateReservationCommand,
    ) -> Result<CreateReservationResult, BookingError> {
        // 1. Staff only, for a known member
        cmd.actor.require_staff()?;
        if self.directory.find_member(&cmd.member_id).await?.is_none() {
            return Err(BookingError::not_found("member", cmd.member_id));
        }

        // 2. Lock the session
        let mut tx = self.uow.begin().await?;
        let session = lock_session(tx.as_mut(), &cmd.session_id).await?;

        // 3. Check the attached payment
        if let Some(payment_id) = &cmd.payment_id {
            check_attached_payment(tx.as_mut(), payment_id, &cmd.member_id, &session.service_id)
                .await?;
        }

        // 4. Take the seat and commit
        let seat = reserve_seat(
            tx.as_mut(),
            session,
            &cmd.member_id,
            cmd.payment_id,
            cmd.note,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            reservation_id = %seat.reservation.id,
            session_id = %seat.session.id,
            member_id = %cmd.member_id,
            payment_id = ?cmd.payment_id,
            "Reservation created by staff"
        );

        Ok(CreateReservationResult {
            reservation: seat.reservation,
            current_bookings: seat.current_bookings,
            remaining_credits: seat.remaining_credits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Payment;
    use crate::domain::reservation::MAX_NOTE_LENGTH;
    use crate::application::handlers::test_support::Studio;
    use crate::domain::foundation::{ConflictReason, ServiceId};
    use crate::ports::PaymentStore;

    fn command(studio: &Studio, session_id: SessionId) -> CreateReservationCommand {
        CreateReservationCommand {
            actor: studio.staff(),
            member_id: studio.member_id,
            session_id,
            payment_id: None,
            note: None,
        }
    }

    async fn seed_payment(studio: &Studio, service_id: ServiceId, paid: bool) -> PaymentId {
        let mut payment = Payment::create_pending(
            PaymentId::new(),
            studio.member_id,
            service_id,
            1,
            1500,
            "EUR",
        )
        .unwrap();
        if paid {
            payment.mark_paid();
        }
        let id = payment.id;
        let mut tx = studio.store.begin().await.unwrap();
        tx.insert_payment(&payment).await.unwrap();
        tx.commit().await.unwrap();
        id
    }

    #[tokio::test]
    async fn staff_books_with_note() {
        let studio = Studio::new().await;
        let session_id = studio.session(3).await;
        studio.grant(studio.member_id, 1).await;

        let result = CreateReservationHandler::new(studio.uow(), studio.directory())
            .handle(CreateReservationCommand {
                note: Some("  front desk  ".to_string()),
                ..command(&studio, session_id)
            })
            .await
            .unwrap();

        assert_eq!(result.reservation.note.as_deref(), Some("front desk"));
        assert_eq!(result.current_bookings, 1);
        assert_eq!(result.remaining_credits, 0);
    }

    #[tokio::test]
    async fn members_cannot_use_staff_path() {
        let studio = Studio::new().await;
        let session_id = studio.session(3).await;
        let err = CreateReservationHandler::new(studio.uow(), studio.directory())
            .handle(CreateReservationCommand {
                actor: studio.member(),
                ..command(&studio, session_id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unknown_member_is_not_found() {
        let studio = Studio::new().await;
        let session_id = studio.session(3).await;
        let err = CreateReservationHandler::new(studio.uow(), studio.directory())
            .handle(CreateReservationCommand {
                member_id: MemberId::new(),
                ..command(&studio, session_id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound { resource: "member", .. }));
    }

    #[tokio::test]
    async fn paid_payment_is_attached_and_credit_still_consumed() {
        let studio = Studio::new().await;
        let session_id = studio.session(3).await;
        let payment_id = seed_payment(&studio, studio.service_id(), true).await;
        studio.grant(studio.member_id, 2).await;

        let result = CreateReservationHandler::new(studio.uow(), studio.directory())
            .handle(CreateReservationCommand {
                payment_id: Some(payment_id),
                ..command(&studio, session_id)
            })
            .await
            .unwrap();

        assert_eq!(result.reservation.payment_id, Some(payment_id));
        assert_eq!(studio.balance(studio.member_id).await, 1);
    }

    #[tokio::test]
    async fn pending_payment_conflicts() {
        let studio = Studio::new().await;
        let session_id = studio.session(3).await;
        let payment_id = seed_payment(&studio, studio.service_id(), false).await;
        studio.grant(studio.member_id, 1).await;

        let err = CreateReservationHandler::new(studio.uow(), studio.directory())
            .handle(CreateReservationCommand {
                payment_id: Some(payment_id),
                ..command(&studio, session_id)
            })
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::conflict(ConflictReason::PaymentNotPaid));
        assert_eq!(studio.balance(studio.member_id).await, 1);
    }

    #[tokio::test]
    async fn payment_for_other_service_is_rejected() {
        let studio = Studio::new().await;
        let session_id = studio.session(3).await;
        let payment_id = seed_payment(&studio, ServiceId::new(), true).await;
        studio.grant(studio.member_id, 1).await;

        let err = CreateReservationHandler::new(studio.uow(), studio.directory())
            .handle(CreateReservationCommand {
                payment_id: Some(payment_id),
                ..command(&studio, session_id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn overlong_note_is_rejected_before_consuming() {
        let studio = Studio::new().await;
        let session_id = studio.session(3).await;
        studio.grant(studio.member_id, 1).await;

        let err = CreateReservationHandler::new(studio.uow(), studio.directory())
            .handle(CreateReservationCommand {
                note: Some("x".repeat(MAX_NOTE_LENGTH + 1)),
                ..command(&studio, session_id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidArgument { .. }));
        assert_eq!(studio.balance(studio.member_id).await, 1);
        assert_eq!(studio.store.reservation_count().await, 0);
    }
}
