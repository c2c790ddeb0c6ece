//! In-memory adapters.
//!
//! Serializable implementations of the persistence and directory ports for
//! tests and local development.

mod booking_store;
mod directory;

pub use booking_store::{InMemoryBookingStore, InMemoryTransaction};
pub use directory::InMemoryDirectory;
