//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers write through a booking unit of work; query handlers
//! read through the lock-free booking reader.

pub mod handlers;
pub mod ledger;

pub use handlers::*;
pub use ledger::CreditLedger;
