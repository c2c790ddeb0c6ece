//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `BookingUnitOfWork` / `BookingTransaction` - Transactional, row-locking
//!   access to sessions, reservations, credits, and payments
//! - `BookingReader` - Lock-free queries for listings
//!
//! ## External Collaborators
//!
//! - `Directory` - Members, services, trainers, and locations (read-only)
//! - `PaymentGateway` - Hosted checkout, payment status, signed notifications

mod booking_reader;
mod booking_store;
mod directory;
mod payment_gateway;

pub use booking_reader::{BookingReader, SessionAvailability, SessionFilter};
pub use booking_store::{
    BookingTransaction, BookingUnitOfWork, CreditStore, PaymentStore, ReservationStore,
    SessionStore,
};
pub use directory::{Directory, LocationRecord, MemberRecord, ServiceRecord, TrainerRecord};
pub use payment_gateway::{
    CheckoutRequest, CheckoutSession, GatewayError, GatewayErrorCode, GatewayPaymentStatus,
    PaymentGateway, WebhookEvent, WebhookEventKind,
};
