//! CancelReservationHandler - Command handler for cancelling one reservation.
//!
//! Cancelling is idempotent. The first cancel refunds the credit the booking
//! consumed; later calls return the reservation unchanged.

use std::sync::Arc;

use crate::application::ledger::CreditLedger;
use crate::domain::foundation::{Actor, BookingError, ReservationId};
use crate::domain::reservation::{CancelOutcome, Reservation};
use crate::ports::{BookingTransaction, BookingUnitOfWork, ReservationStore, SessionStore};

#[derive(Debug, Clone)]
pub struct CancelReservationCommand {
    pub actor: Actor,
    pub reservation_id: ReservationId,
}

#[derive(Debug, Clone)]
pub struct CancelReservationResult {
    pub reservation: Reservation,
    pub refunded: bool,
}

pub struct CancelReservationHandler {
    uow: Arc<dyn BookingUnitOfWork>,
}

impl CancelReservationHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn handle(
        &self,
        cmd: CancelReservationCommand,
    ) -> Result<CancelReservationResult, BookingError> {
        let mut tx = self.uow.begin().await?;

        // 1. Load and authorize
        let mut reservation = tx
            .find_reservation_for_update(&cmd.reservation_id)
            .await?
            .ok_or_else(|| BookingError::not_found("reservation", cmd.reservation_id))?;
        cmd.actor.ensure_can_act_for(&reservation.member_id)?;

        // 2. Transition
        let refund_credit = match reservation.cancel() {
            CancelOutcome::AlreadyCancelled => {
                return Ok(CancelReservationResult {
                    reservation,
                    refunded: false,
                });
            }
            CancelOutcome::Cancelled { refund_credit } => refund_credit,
        };

        // 3. Refund against the session's service
        if refund_credit {
            let session = tx
                .find_session(&reservation.session_id)
                .await?
                .ok_or_else(|| BookingError::not_found("session", reservation.session_id))?;
            CreditLedger::add(tx.as_mut(), &reservation.member_id, &session.service_id, 1)
                .await?;
        }

        tx.update_reservation(&reservation).await?;
        tx.commit().await?;

        tracing::info!(
            reservation_id = %reservation.id,
            session_id = %reservation.session_id,
            member_id = %reservation.member_id,
            refunded = refund_credit,
            "Reservation cancelled"
        );

        Ok(CancelReservationResult {
            reservation,
            refunded: refund_credit,
        })
    }
}
