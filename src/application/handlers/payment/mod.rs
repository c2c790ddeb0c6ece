//! Payment reconciler handlers.

mod confirm_payment;
mod create_payment;
mod expire_stale_payments;
mod get_payment;
mod handle_gateway_webhook;
mod mark_payment_paid;
mod settlement;
mod update_payment;

use std::time::Duration;

use crate::domain::payment::DEFAULT_CURRENCY;

pub use confirm_payment::{ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult};
pub use create_payment::{CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult};
pub use expire_stale_payments::{
    ExpireStalePaymentsCommand, ExpireStalePaymentsHandler, ExpireStalePaymentsResult,
};
pub use get_payment::{GetPaymentHandler, GetPaymentQuery, ListPaymentsHandler, ListPaymentsQuery};
pub use handle_gateway_webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
};
pub use mark_payment_paid::{
    MarkPaymentPaidCommand, MarkPaymentPaidHandler, MarkPaymentPaidResult,
};
pub use settlement::Settlement;
pub use update_payment::{UpdatePaymentCommand, UpdatePaymentHandler};

/// Checkout parameters taken from configuration.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub success_url: String,
    pub cancel_url: String,
    pub default_currency: String,
    pub gateway_timeout: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            success_url: "http://localhost:3000/payments/success".to_string(),
            cancel_url: "http://localhost:3000/payments/cancel".to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            gateway_timeout: Duration::from_secs(10),
        }
    }
}
