//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the acting identity, and the error
//! types that form the vocabulary of the booking domain.

mod auth;
mod booking_error;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{Actor, StaffRole};
pub use booking_error::{BookingError, ConflictReason};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    EmployeeId, LocationId, MemberCreditId, MemberId, PaymentId, ReservationId, ServiceId,
    SessionId,
};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
