//! Reservation domain module.
//!
//! # Module Structure
//!
//! - `aggregate` - Reservation aggregate and cancel outcome
//! - `status` - ReservationStatus state machine

mod aggregate;
mod status;

pub use aggregate::{CancelOutcome, Reservation, MAX_NOTE_LENGTH};
pub use status::ReservationStatus;
