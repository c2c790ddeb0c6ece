//! Directory checks shared by schedule and reschedule.

use crate::domain::foundation::{BookingError, EmployeeId, LocationId, ServiceId};
use crate::ports::{Directory, ServiceRecord, TrainerRecord};

/// Resolve service and trainer and require both to belong to `location_id`.
pub(super) async fn resolve_placement(
    directory: &dyn Directory,
    location_id: &LocationId,
    service_id: &ServiceId,
    trainer_id: &EmployeeId,
) -> Result<(ServiceRecord, TrainerRecord), BookingError> {
    directory
        .find_location(location_id)
        .await?
        .ok_or_else(|| BookingError::not_found("location", location_id))?;
    let service = directory
        .find_service(service_id)
        .await?
        .ok_or_else(|| BookingError::not_found("service", service_id))?;
    let trainer = resolve_trainer(directory, location_id, trainer_id).await?;

    if service.location_id != *location_id {
        return Err(BookingError::invalid_argument(
            "service_id",
            "Service does not belong to the selected location",
        ));
    }
    Ok((service, trainer))
}

/// Resolve a trainer and require it to work at `location_id`.
pub(super) async fn resolve_trainer(
    directory: &dyn Directory,
    location_id: &LocationId,
    trainer_id: &EmployeeId,
) -> Result<TrainerRecord, BookingError> {
    let trainer = directory
        .find_trainer(trainer_id)
        .await?
        .ok_or_else(|| BookingError::not_found("employee", trainer_id))?;
    if trainer.location_id != *location_id {
        return Err(BookingError::invalid_argument(
            "trainer_id",
            "Trainer does not belong to the selected location",
        ));
    }
    Ok(trainer)
}
