//! CancelSessionHandler - Command handler for cancelling a session.
//!
//! Cancelling a session cancels every active reservation on it and refunds
//! the credits they consumed, all in one transaction.

use std::sync::Arc;

use crate::application::ledger::CreditLedger;
use crate::domain::foundation::{Actor, BookingError, SessionId};
use crate::domain::reservation::CancelOutcome;
use crate::domain::scheduling::Session;
use crate::ports::{BookingTransaction, BookingUnitOfWork, ReservationStore, SessionStore};

#[derive(Debug, Clone)]
pub struct CancelSessionCommand {
    pub actor: Actor,
    pub session_id: SessionId,
}

#[derive(Debug, Clone)]
pub struct CancelSessionResult {
    pub session: Session,
    /// Reservations moved to cancelled by this call.
    pub cancelled_reservations: usize,
    /// Credits returned to members by this call.
    pub refunded_credits: usize,
}

pub struct CancelSessionHandler {
    uow: Arc<dyn BookingUnitOfWork>,
}

impl CancelSessionHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn handle(
        &self,
        cmd: CancelSessionCommand,
    ) -> Result<CancelSessionResult, BookingError> {
        cmd.actor.require_staff()?;

        let mut tx = self.uow.begin().await?;
        let mut session = tx
            .find_session_for_update(&cmd.session_id)
            .await?
            .ok_or_else(|| BookingError::not_found("session", cmd.session_id))?;

        if !session.cancel() {
            return Ok(CancelSessionResult {
                session,
                cancelled_reservations: 0,
                refunded_credits: 0,
            });
        }

        let mut cancelled_reservations = 0;
        let mut refunded_credits = 0;
        for mut reservation in tx.active_reservations_for_session(&session.id).await? {
            if let CancelOutcome::Cancelled { refund_credit } = reservation.cancel() {
                cancelled_reservations += 1;
                if refund_credit {
                    CreditLedger::add(
                        tx.as_mut(),
                        &reservation.member_id,
                        &session.service_id,
                        1,
                    )
                    .await?;
                    refunded_credits += 1;
                }
                tx.update_reservation(&reservation).await?;
            }
        }

        tx.update_session(&session).await?;
        tx.commit().await?;

        tracing::info!(
            session_id = %session.id,
            cancelled_reservations,
            refunded_credits,
            "Session cancelled"
        );

        Ok(CancelSessionResult {
            session,
            cancelled_reservations,
            refunded_credits,
        })
    }
}
