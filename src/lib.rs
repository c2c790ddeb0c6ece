//! Studio Booking - Session booking and credit ledger engine
//!
//! Members of multi-location fitness studios buy session credits through a
//! hosted checkout, spend one credit per booked seat, and get it back when a
//! reservation or session is cancelled. Capacity, ledger balances, and payment
//! settlement stay consistent under concurrent requests.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
