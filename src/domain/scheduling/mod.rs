//! Scheduling domain module.
//!
//! Class sessions: time window, capacity, trainer, and lifecycle.
//!
//! # Module Structure
//!
//! - `aggregate` - Session aggregate and `TimeWindow` value object
//! - `status` - SessionStatus state machine

mod aggregate;
mod status;

pub use aggregate::{Session, TimeWindow, MAX_SESSION_CAPACITY};
pub use status::SessionStatus;
