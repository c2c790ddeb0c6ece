//! GetReservationHandler / ListMemberReservationsHandler / ListReservationsHandler -
//! Reservation queries.

use std::sync::Arc;

use crate::domain::foundation::{Actor, BookingError, MemberId, ReservationId};
use crate::domain::reservation::Reservation;
use crate::ports::BookingReader;

#[derive(Debug, Clone)]
pub struct GetReservationQuery {
    pub actor: Actor,
    pub reservation_id: ReservationId,
}

pub struct GetReservationHandler {
    reader: Arc<dyn BookingReader>,
}

impl GetReservationHandler {
    pub fn new(reader: Arc<dyn BookingReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: GetReservationQuery) -> Result<Reservation, BookingError> {
        let reservation = self
            .reader
            .get_reservation(&query.reservation_id)
            .await?
            .ok_or_else(|| BookingError::not_found("reservation", query.reservation_id))?;

        // Members see only their own reservations
        query.actor.ensure_can_act_for(&reservation.member_id)?;

        Ok(reservation)
    }
}

#[derive(Debug, Clone)]
pub struct ListMemberReservationsQuery {
    pub actor: Actor,
    pub member_id: MemberId,
}

/// Lists a member's reservations, newest first.
pub struct ListMemberReservationsHandler {
    reader: Arc<dyn BookingReader>,
}

impl ListMemberReservationsHandler {
    pub fn new(reader: Arc<dyn BookingReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: ListMemberReservationsQuery,
    ) -> Result<Vec<Reservation>, BookingError> {
        query.actor.ensure_can_act_for(&query.member_id)?;
        Ok(self
            .reader
            .list_reservations_for_member(&query.member_id)
            .await?)
    }
}

#[derive(Debug, Clone)]
pub struct ListReservationsQuery {
    pub actor: Actor,
}

/// Lists every reservation, newest first. Staff only.
pub struct ListReservationsHandler {
    reader: Arc<dyn BookingReader>,
}

impl ListReservationsHandler {
    pub fn new(reader: Arc<dyn BookingReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: ListReservationsQuery) -> Result<Vec<Reservation>, BookingError> {
        query.actor.require_staff()?;
        Ok(self.reader.list_reservations().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Studio;

    async fn seeded(studio: &Studio) -> ReservationId {
        let session_id = studio.session(3).await;
        let reservation =
            Reservation::book(ReservationId::new(), studio.member_id, session_id, None, None)
                .unwrap();
        let id = reservation.id;
        studio.store.seed_reservation(reservation).await;
        id
    }

    #[tokio::test]
    async fn owner_can_read_reservation() {
        let studio = Studio::new().await;
        let reservation_id = seeded(&studio).await;

        let reservation = GetReservationHandler::new(studio.reader())
            .handle(GetReservationQuery {
                actor: studio.member(),
                reservation_id,
            })
            .await
            .unwrap();
        assert_eq!(reservation.member_id, studio.member_id);
    }

    #[tokio::test]
    async fn other_member_is_forbidden() {
        let studio = Studio::new().await;
        let reservation_id = seeded(&studio).await;

        let err = GetReservationHandler::new(studio.reader())
            .handle(GetReservationQuery {
                actor: Actor::member(MemberId::new()),
                reservation_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_reservation_is_not_found() {
        let studio = Studio::new().await;
        let err = GetReservationHandler::new(studio.reader())
            .handle(GetReservationQuery {
                actor: studio.staff(),
                reservation_id: ReservationId::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::domain::foundation::ErrorCode::ReservationNotFound);
    }

    #[tokio::test]
    async fn lists_member_reservations() {
        let studio = Studio::new().await;
        seeded(&studio).await;
        seeded(&studio).await;

        let list = ListMemberReservationsHandler::new(studio.reader())
            .handle(ListMemberReservationsQuery {
                actor: studio.member(),
                member_id: studio.member_id,
            })
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn staff_lists_all_reservations() {
        let studio = Studio::new().await;
        seeded(&studio).await;
        let other = Reservation::book(
            ReservationId::new(),
            MemberId::new(),
            studio.session(2).await,
            None,
            None,
        )
        .unwrap();
        studio.store.seed_reservation(other).await;

        let list = ListReservationsHandler::new(studio.reader())
            .handle(ListReservationsQuery {
                actor: studio.staff(),
            })
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn members_cannot_list_all_reservations() {
        let studio = Studio::new().await;
        let err = ListReservationsHandler::new(studio.reader())
            .handle(ListReservationsQuery {
                actor: studio.member(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }
}
