//! ScheduleSessionHandler - Command handler for creating class sessions.

use std::sync::Arc;

use crate::domain::foundation::{
    Actor, BookingError, ConflictReason, EmployeeId, LocationId, ServiceId, SessionId, Timestamp,
};
use crate::domain::scheduling::{Session, TimeWindow};
use crate::ports::{BookingTransaction, BookingUnitOfWork, Directory, SessionStore};

use super::placement::resolve_placement;

/// Command to schedule a new session.
#[derive(Debug, Clone)]
pub struct ScheduleSessionCommand {
    pub actor: Actor,
    pub location_id: LocationId,
    pub service_id: ServiceId,
    pub trainer_id: EmployeeId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub capacity: i32,
}

/// Result of successful scheduling.
#[derive(Debug, Clone)]
pub struct ScheduleSessionResult {
    pub session: Session,
}

/// Handler for scheduling sessions.
///
/// Trainer schedule writes are serialized per trainer, so two concurrent
/// requests cannot both pass the overlap check.
pub struct ScheduleSessionHandler {
    uow: Arc<dyn BookingUnitOfWork>,
    directory: Arc<dyn Directory>,
}

impl ScheduleSessionHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>, directory: Arc<dyn Directory>) -> Self {
        Self { uow, directory }
    }

    pub async fn handle(
        &self,
        cmd: ScheduleSessionCommand,
    ) -> Result<ScheduleSessionResult, BookingError> {
        cmd.actor.require_staff()?;

        // 1. Validate input and directory references
        let window = TimeWindow::new(cmd.starts_at, cmd.ends_at)?;
        resolve_placement(
            self.directory.as_ref(),
            &cmd.location_id,
            &cmd.service_id,
            &cmd.trainer_id,
        )
        .await?;

        let session = Session::schedule(
            SessionId::new(),
            cmd.location_id,
            cmd.service_id,
            cmd.trainer_id,
            window,
            cmd.capacity,
        )?;

        // 2. Check trainer availability under the trainer lock
        let mut tx = self.uow.begin().await?;
        tx.lock_trainer_schedule(&cmd.trainer_id).await?;
        if tx
            .exists_trainer_overlap(&cmd.trainer_id, &window, None)
            .await?
        {
            return Err(BookingError::conflict(ConflictReason::TrainerOverlap));
        }

        // 3. Persist
        tx.insert_session(&session).await?;
        tx.commit().await?;

        tracing::info!(
            session_id = %session.id,
            trainer_id = %session.trainer_id,
            capacity = session.capacity,
            "Session scheduled"
        );

        Ok(ScheduleSessionResult { session })
    }
}
