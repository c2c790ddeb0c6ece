//! HTTP adapter for booking endpoints.
//!
//! Exposes the booking engine via REST API under `/api`:
//! - `/member/*` - Credits, bookable sessions, own reservations
//! - `/reservations/*` - Create, list, inspect, edit, cancel reservations
//! - `/sessions/*` - Staff scheduling
//! - `/payments/*` - Credit purchases and reconciliation
//! - `/webhooks/stripe` - Gateway notifications

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BookingAppState;
pub use routes::booking_router;
