//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, actor, errors)
//! - `credits` - Per member and service credit balances
//! - `scheduling` - Class sessions and trainer time windows
//! - `reservation` - Member reservations against sessions
//! - `payment` - Credit purchases and their fulfilment

pub mod credits;
pub mod foundation;
pub mod payment;
pub mod reservation;
pub mod scheduling;
