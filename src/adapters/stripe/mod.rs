//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for Stripe Checkout, including:
//! - One-off credit purchase checkouts
//! - Checkout status lookups for the confirm poll
//! - Webhook signature verification
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute window)
//! - All secrets are handled via `secrecy::SecretString`

mod mock_payment_gateway;
mod stripe_adapter;
mod webhook_types;

pub use mock_payment_gateway::MockPaymentGateway;
pub use stripe_adapter::{StripeConfig, StripePaymentGateway};
pub use webhook_types::{SignatureHeader, SignatureParseError, StripeCheckoutSession, StripeWebhookEvent};
