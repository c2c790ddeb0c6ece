//! Session registry handlers.

mod cancel_session;
mod list_available_sessions;
mod placement;
mod reschedule_session;
mod schedule_session;

pub use cancel_session::{CancelSessionCommand, CancelSessionHandler, CancelSessionResult};
pub use list_available_sessions::{
    AvailableSessionView, ListAvailableSessionsHandler, ListAvailableSessionsQuery,
};
pub use reschedule_session::{
    RescheduleSessionCommand, RescheduleSessionHandler, RescheduleSessionResult,
};
pub use schedule_session::{ScheduleSessionCommand, ScheduleSessionHandler, ScheduleSessionResult};
