//! Payment gateway port for hosted checkout.
//!
//! Defines the contract for payment gateway integrations (e.g., Stripe).
//! The gateway hosts the checkout page, reports whether a checkout was paid,
//! and signs the notifications it sends.
//!
//! # Design
//!
//! - **Gateway agnostic**: the engine only sees an opaque reference string
//! - **No open transactions**: callers never hold row locks across a call
//! - **Retry-aware**: errors say whether the same call may be retried

use crate::domain::foundation::{DomainError, ErrorCode, MemberId, PaymentId, ServiceId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for hosted-checkout payment gateways.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout for one credit purchase.
    ///
    /// Returns the gateway reference and the URL to redirect the member to.
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Ask the gateway whether the checkout behind `reference` was paid.
    async fn retrieve_payment_status(
        &self,
        reference: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError>;

    /// Verify a notification signature and parse the event.
    ///
    /// Returns the parsed event if valid, error if the signature is invalid.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent, GatewayError>;
}

/// Request to create a checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub payment_id: PaymentId,
    pub member_id: MemberId,
    pub service_id: ServiceId,

    /// Product line shown to the member, e.g. "Yoga credit".
    pub product_name: String,

    /// Price of one line unit in minor units.
    pub unit_amount_cents: i64,

    /// Units on the checkout line.
    pub line_quantity: i32,

    /// Credits purchased, carried as correlation metadata.
    pub credit_quantity: i32,

    /// ISO currency code.
    pub currency: String,

    pub success_url: String,
    pub cancel_url: String,
}

/// Checkout created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Gateway reference, stored as the payment's external ref.
    pub reference: String,

    /// URL for the member to complete checkout.
    pub url: String,
}

/// Payment state reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    Unknown,
}

impl GatewayPaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, GatewayPaymentStatus::Paid)
    }

    pub fn from_provider(status: &str) -> Self {
        match status {
            "paid" => GatewayPaymentStatus::Paid,
            "unpaid" => GatewayPaymentStatus::Unpaid,
            "no_payment_required" => GatewayPaymentStatus::NoPaymentRequired,
            _ => GatewayPaymentStatus::Unknown,
        }
    }
}

/// Verified notification from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from the gateway.
    pub id: String,

    pub kind: WebhookEventKind,

    /// When the event occurred (Unix timestamp).
    pub created_at: i64,
}

/// Notification kinds the reconciler distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    /// A checkout finished; the payment may or may not be paid yet.
    CheckoutCompleted {
        reference: String,
        payment_status: GatewayPaymentStatus,
    },

    /// Any other event type, acknowledged and ignored.
    Other(String),
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Timeout, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidWebhook, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = match err.code {
            GatewayErrorCode::InvalidWebhook => ErrorCode::InvalidWebhookSignature,
            _ => ErrorCode::PaymentGatewayError,
        };
        DomainError::new(code, err.message)
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    NetworkError,
    Timeout,
    AuthenticationError,
    NotFound,
    RateLimitExceeded,
    InvalidWebhook,
    ProviderError,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::Timeout
                | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::InvalidWebhook => "invalid_webhook",
            GatewayErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
