//! BookSessionHandler - Command handler for a member booking a session.
//!
//! Booking consumes one credit for the session's service. The credit and the
//! reservation are written in the same transaction.

use std::sync::Arc;

use serde::Serialize;

use super::seat::{lock_session, reserve_seat};
use crate::domain::foundation::{Actor, BookingError, MemberId, ReservationId, SessionId};
use crate::ports::{BookingTransaction, BookingUnitOfWork};

#[derive(Debug, Clone)]
pub struct BookSessionCommand {
    pub actor: Actor,
    pub member_id: MemberId,
    pub session_id: SessionId,
}

/// What the member sees after a successful booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub reservation_id: ReservationId,
    pub session_id: SessionId,
    pub current_bookings: i64,
    pub remaining_credits: i32,
}

pub struct BookSessionHandler {
    uow: Arc<dyn BookingUnitOfWork>,
}

impl BookSessionHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn handle(&self, cmd: BookSessionCommand) -> Result<BookingConfirmation, BookingError> {
        // 1. Members book only for themselves
        cmd.actor.ensure_can_act_for(&cmd.member_id)?;

        // 2. Lock the session and take a seat
        let mut tx = self.uow.begin().await?;
        let session = lock_session(tx.as_mut(), &cmd.session_id).await?;
        let seat = reserve_seat(tx.as_mut(), session, &cmd.member_id, None, None).await?;

        // 3. Commit credit and reservation together
        tx.commit().await?;

        tracing::info!(
            reservation_id = %seat.reservation.id,
            session_id = %seat.session.id,
            member_id = %cmd.member_id,
            current_bookings = seat.current_bookings,
            remaining_credits = seat.remaining_credits,
            "Session booked"
        );

        Ok(BookingConfirmation {
            reservation_id: seat.reservation.id,
            session_id: seat.session.id,
            current_bookings: seat.current_bookings,
            remaining_credits: seat.remaining_credits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Studio;
    use crate::domain::foundation::{ConflictReason, ErrorCode};
    use crate::domain::scheduling::Session;

    fn command(studio: &Studio, session_id: SessionId) -> BookSessionCommand {
        BookSessionCommand {
            actor: studio.member(),
            member_id: studio.member_id,
            session_id,
        }
    }

    #[tokio::test]
    async fn books_and_consumes_one_credit() {
        let studio = Studio::new().await;
        let session_id = studio.session(5).await;
        studio.grant(studio.member_id, 3).await;

        let confirmation = BookSessionHandler::new(studio.uow())
            .handle(command(&studio, session_id))
            .await
            .unwrap();

        assert_eq!(confirmation.session_id, session_id);
        assert_eq!(confirmation.current_bookings, 1);
        assert_eq!(confirmation.remaining_credits, 2);
        assert_eq!(studio.balance(studio.member_id).await, 2);
    }

    #[tokio::test]
    async fn no_credits_leaves_no_reservation() {
        let studio = Studio::new().await;
        let session_id = studio.session(5).await;

        let err = BookSessionHandler::new(studio.uow())
            .handle(command(&studio, session_id))
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::insufficient_credits(0, 1));
        assert_eq!(studio.store.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn second_booking_by_same_member_conflicts() {
        let studio = Studio::new().await;
        let session_id = studio.session(5).await;
        studio.grant(studio.member_id, 2).await;
        let handler = BookSessionHandler::new(studio.uow());

        handler.handle(command(&studio, session_id)).await.unwrap();
        let err = handler.handle(command(&studio, session_id)).await.unwrap_err();

        assert_eq!(err, BookingError::conflict(ConflictReason::AlreadyBooked));
        assert_eq!(studio.balance(studio.member_id).await, 1);
    }

    #[tokio::test]
    async fn full_session_conflicts_without_consuming() {
        let studio = Studio::new().await;
        let session_id = studio.session(1).await;
        let other = MemberId::new();
        studio.grant(other, 1).await;
        studio.grant(studio.member_id, 1).await;
        let handler = BookSessionHandler::new(studio.uow());

        handler
            .handle(BookSessionCommand {
                actor: Actor::member(other),
                member_id: other,
                session_id,
            })
            .await
            .unwrap();
        let err = handler.handle(command(&studio, session_id)).await.unwrap_err();

        assert_eq!(err, BookingError::conflict(ConflictReason::SessionFull));
        assert_eq!(studio.balance(studio.member_id).await, 1);
    }

    #[tokio::test]
    async fn cancelled_session_is_not_bookable() {
        let studio = Studio::new().await;
        let mut session = Session::schedule(
            SessionId::new(),
            studio.location_id,
            studio.service_id(),
            studio.trainer.id,
            studio.window(24),
            5,
        )
        .unwrap();
        session.cancel();
        let session_id = session.id;
        studio.store.seed_session(session).await;
        studio.grant(studio.member_id, 1).await;

        let err = BookSessionHandler::new(studio.uow())
            .handle(command(&studio, session_id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let studio = Studio::new().await;
        let err = BookSessionHandler::new(studio.uow())
            .handle(command(&studio, SessionId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound { resource: "session", .. }));
    }

    #[tokio::test]
    async fn member_cannot_book_for_someone_else() {
        let studio = Studio::new().await;
        let session_id = studio.session(5).await;
        let err = BookSessionHandler::new(studio.uow())
            .handle(BookSessionCommand {
                actor: Actor::member(MemberId::new()),
                member_id: studio.member_id,
                session_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }
}
