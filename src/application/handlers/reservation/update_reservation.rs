//! UpdateReservationHandler - Command handler for staff edits to a reservation.
//!
//! Only the note and the attached payment can change. Moving a reservation to
//! another member or session means cancelling it and booking again.

use std::sync::Arc;

use super::seat::check_attached_payment;
use crate::domain::foundation::{Actor, BookingError, MemberId, PaymentId, ReservationId, SessionId};
use crate::domain::reservation::Reservation;
use crate::ports::{BookingTransaction, BookingUnitOfWork, ReservationStore, SessionStore};

#[derive(Debug, Clone)]
pub struct UpdateReservationCommand {
    pub actor: Actor,
    pub reservation_id: ReservationId,
    /// When given, must match the reservation's member.
    pub member_id: Option<MemberId>,
    /// When given, must match the reservation's session.
    pub session_id: Option<SessionId>,
    pub payment_id: Option<PaymentId>,
    pub note: Option<String>,
}

pub struct UpdateReservationHandler {
    uow: Arc<dyn BookingUnitOfWork>,
}

impl UpdateReservationHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn handle(&self, cmd: UpdateReservationCommand) -> Result<Reservation, BookingError> {
        cmd.actor.require_staff()?;

        let mut tx = self.uow.begin().await?;
        let mut reservation = tx
            .find_reservation_for_update(&cmd.reservation_id)
            .await?
            .ok_or_else(|| BookingError::not_found("reservation", cmd.reservation_id))?;

        let moves_member = cmd.member_id.is_some_and(|m| m != reservation.member_id);
        let moves_session = cmd.session_id.is_some_and(|s| s != reservation.session_id);
        if moves_member || moves_session {
            return Err(BookingError::invalid_argument(
                if moves_member { "member_id" } else { "session_id" },
                "Changing member or session is not allowed; cancel and book again",
            ));
        }
        if !reservation.is_active() {
            return Err(BookingError::invalid_state(
                reservation.status.as_str(),
                "update reservation",
            ));
        }

        // Re-check a newly attached payment against the session's service
        if let Some(payment_id) = cmd.payment_id.filter(|p| Some(*p) != reservation.payment_id) {
            let session = tx
                .find_session(&reservation.session_id)
                .await?
                .ok_or_else(|| BookingError::not_found("session", reservation.session_id))?;
            check_attached_payment(
                tx.as_mut(),
                &payment_id,
                &reservation.member_id,
                &session.service_id,
            )
            .await?;
        }

        reservation.amend(cmd.payment_id, cmd.note)?;
        tx.update_reservation(&reservation).await?;
        tx.commit().await?;

        tracing::info!(
            reservation_id = %reservation.id,
            payment_id = ?reservation.payment_id,
            "Reservation updated"
        );

        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::reservation::{
        CancelReservationCommand, CancelReservationHandler,
    };
    use crate::application::handlers::test_support::Studio;
    use crate::domain::foundation::{ConflictReason, ErrorCode};
    use crate::domain::reservation::ReservationStatus;
    use crate::ports::BookingReader;

    async fn seeded(studio: &Studio) -> Reservation {
        let session_id = studio.session(3).await;
        let reservation =
            Reservation::book(ReservationId::new(), studio.member_id, session_id, None, None)
                .unwrap();
        studio.store.seed_reservation(reservation.clone()).await;
        reservation
    }

    fn command(studio: &Studio, reservation: &Reservation) -> UpdateReservationCommand {
        UpdateReservationCommand {
            actor: studio.staff(),
            reservation_id: reservation.id,
            member_id: Some(reservation.member_id),
            session_id: Some(reservation.session_id),
            payment_id: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn staff_attaches_paid_payment_and_note() {
        let studio = Studio::new().await;
        let reservation = seeded(&studio).await;
        let payment_id = studio.paid_payment(1).await;

        let updated = UpdateReservationHandler::new(studio.uow())
            .handle(UpdateReservationCommand {
                payment_id: Some(payment_id),
                note: Some("paid at desk".to_string()),
                ..command(&studio, &reservation)
            })
            .await
            .unwrap();

        assert_eq!(updated.payment_id, Some(payment_id));
        assert_eq!(updated.note.as_deref(), Some("paid at desk"));
        assert_eq!(updated.status, ReservationStatus::Active);

        let stored = studio.store.get_reservation(&reservation.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn members_cannot_update() {
        let studio = Studio::new().await;
        let reservation = seeded(&studio).await;

        let err = UpdateReservationHandler::new(studio.uow())
            .handle(UpdateReservationCommand {
                actor: studio.member(),
                ..command(&studio, &reservation)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }

    #[tokio::test]
    async fn changing_session_is_rejected() {
        let studio = Studio::new().await;
        let reservation = seeded(&studio).await;

        let err = UpdateReservationHandler::new(studio.uow())
            .handle(UpdateReservationCommand {
                session_id: Some(SessionId::new()),
                ..command(&studio, &reservation)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidArgument { ref field, .. } if field == "session_id"));
    }

    #[tokio::test]
    async fn pending_payment_is_rejected() {
        let studio = Studio::new().await;
        let reservation = seeded(&studio).await;
        let payment_id = studio.pending_payment(1).await;

        let err = UpdateReservationHandler::new(studio.uow())
            .handle(UpdateReservationCommand {
                payment_id: Some(payment_id),
                ..command(&studio, &reservation)
            })
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::conflict(ConflictReason::PaymentNotPaid));

        let stored = studio.store.get_reservation(&reservation.id).await.unwrap().unwrap();
        assert!(stored.payment_id.is_none());
    }

    #[tokio::test]
    async fn cancelled_reservation_cannot_be_edited() {
        let studio = Studio::new().await;
        let reservation = seeded(&studio).await;
        CancelReservationHandler::new(studio.uow())
            .handle(CancelReservationCommand {
                actor: studio.staff(),
                reservation_id: reservation.id,
            })
            .await
            .unwrap();

        let err = UpdateReservationHandler::new(studio.uow())
            .handle(UpdateReservationCommand {
                note: Some("late".to_string()),
                ..command(&studio, &reservation)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn unknown_reservation_is_not_found() {
        let studio = Studio::new().await;
        let reservation = seeded(&studio).await;

        let err = UpdateReservationHandler::new(studio.uow())
            .handle(UpdateReservationCommand {
                reservation_id: ReservationId::new(),
                ..command(&studio, &reservation)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound { resource: "reservation", .. }));
    }
}
