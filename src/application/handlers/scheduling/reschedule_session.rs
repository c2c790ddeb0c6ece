//! RescheduleSessionHandler - Command handler for moving a session.

use std::sync::Arc;

use crate::domain::foundation::{
    Actor, BookingError, ConflictReason, EmployeeId, SessionId, Timestamp,
};
use crate::domain::scheduling::{Session, TimeWindow};
use crate::ports::{
    BookingTransaction, BookingUnitOfWork, Directory, ReservationStore, SessionStore,
};

use super::placement::resolve_trainer;

/// Command to change a session's window, capacity, and optionally trainer.
#[derive(Debug, Clone)]
pub struct RescheduleSessionCommand {
    pub actor: Actor,
    pub session_id: SessionId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub capacity: i32,
    /// Keep the current trainer when `None`.
    pub trainer_id: Option<EmployeeId>,
}

#[derive(Debug, Clone)]
pub struct RescheduleSessionResult {
    pub session: Session,
    pub active_count: i64,
}

/// Handler for rescheduling sessions.
pub struct RescheduleSessionHandler {
    uow: Arc<dyn BookingUnitOfWork>,
    directory: Arc<dyn Directory>,
}

impl RescheduleSessionHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>, directory: Arc<dyn Directory>) -> Self {
        Self { uow, directory }
    }

    pub async fn handle(
        &self,
        cmd: RescheduleSessionCommand,
    ) -> Result<RescheduleSessionResult, BookingError> {
        cmd.actor.require_staff()?;
        let window = TimeWindow::new(cmd.starts_at, cmd.ends_at)?;

        let mut tx = self.uow.begin().await?;
        let mut session = tx
            .find_session_for_update(&cmd.session_id)
            .await?
            .ok_or_else(|| BookingError::not_found("session", cmd.session_id))?;
        if !session.is_bookable() {
            return Err(BookingError::invalid_state(
                session.status.as_str(),
                "reschedule session",
            ));
        }

        let trainer_id = match cmd.trainer_id {
            Some(trainer_id) => {
                resolve_trainer(self.directory.as_ref(), &session.location_id, &trainer_id)
                    .await?
                    .id
            }
            None => session.trainer_id,
        };

        tx.lock_trainer_schedule(&trainer_id).await?;
        if tx
            .exists_trainer_overlap(&trainer_id, &window, Some(&session.id))
            .await?
        {
            return Err(BookingError::conflict(ConflictReason::TrainerOverlap));
        }

        let active_count = tx.count_active_reservations(&session.id).await?;
        if (cmd.capacity as i64) < active_count {
            return Err(BookingError::conflict(
                ConflictReason::CapacityBelowBookings,
            ));
        }

        session.reschedule(window, cmd.capacity, trainer_id)?;
        tx.update_session(&session).await?;
        tx.commit().await?;

        tracing::info!(
            session_id = %session.id,
            trainer_id = %session.trainer_id,
            capacity = session.capacity,
            active_count,
            "Session rescheduled"
        );

        Ok(RescheduleSessionResult {
            session,
            active_count,
        })
    }
}
