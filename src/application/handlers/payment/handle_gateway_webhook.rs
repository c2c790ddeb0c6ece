//! HandleGatewayWebhookHandler - Command handler for payment gateway notifications.

use std::sync::Arc;

use crate::domain::foundation::{BookingError, PaymentId};
use crate::ports::{
    BookingTransaction, BookingUnitOfWork, PaymentGateway, PaymentStore, WebhookEventKind,
};

use super::settlement::settle;

#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleGatewayWebhookResult {
    /// Payment moved to paid or had its credits issued.
    PaymentSettled {
        payment_id: PaymentId,
        credits_added: Option<i32>,
    },
    /// Payment was already fully settled.
    AlreadySettled { payment_id: PaymentId },
    /// Checkout finished but the funds have not arrived yet.
    AwaitingPayment { reference: String },
    /// No payment carries the reference.
    Unmatched { reference: String },
    /// Event type the reconciler does not act on.
    Acknowledged { event_type: String },
}

/// Verifies and applies gateway notifications.
///
/// Deliveries may repeat or race the checkout return poll; settling is
/// idempotent under the payment row lock.
pub struct HandleGatewayWebhookHandler {
    uow: Arc<dyn BookingUnitOfWork>,
    gateway: Arc<dyn PaymentGateway>,
}

impl HandleGatewayWebhookHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { uow, gateway }
    }

    pub async fn handle(
        &self,
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<HandleGatewayWebhookResult, BookingError> {
        // 1. Verify signature and parse event
        let event = self
            .gateway
            .verify_webhook(&cmd.payload, &cmd.signature)
            .map_err(|err| {
                tracing::warn!(error = %err, "Webhook signature rejected");
                BookingError::upstream(err.message, false)
            })?;

        // 2. Process based on event type
        match event.kind {
            WebhookEventKind::CheckoutCompleted {
                reference,
                payment_status,
            } if !payment_status.is_paid() => {
                tracing::info!(
                    event_id = %event.id,
                    external_ref = %reference,
                    payment_status = ?payment_status,
                    "Checkout completed without payment, awaiting settlement"
                );
                Ok(HandleGatewayWebhookResult::AwaitingPayment { reference })
            }
            WebhookEventKind::CheckoutCompleted { reference, .. } => {
                self.handle_checkout_completed(&event.id, reference).await
            }
            WebhookEventKind::Other(event_type) => {
                tracing::debug!(event_id = %event.id, event_type = %event_type, "Webhook acknowledged");
                Ok(HandleGatewayWebhookResult::Acknowledged { event_type })
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event_id: &str,
        reference: String,
    ) -> Result<HandleGatewayWebhookResult, BookingError> {
        let mut tx = self.uow.begin().await?;
        let Some(mut payment) = tx.find_payment_by_external_ref_for_update(&reference).await? else {
            tracing::warn!(
                event_id = %event_id,
                external_ref = %reference,
                "Webhook references unknown payment"
            );
            return Ok(HandleGatewayWebhookResult::Unmatched { reference });
        };

        let settlement = settle(tx.as_mut(), &mut payment).await?;
        tx.commit().await?;

        if !settlement.changed() {
            return Ok(HandleGatewayWebhookResult::AlreadySettled {
                payment_id: payment.id,
            });
        }

        tracing::info!(
            event_id = %event_id,
            payment_id = %payment.id,
            external_ref = %reference,
            "Payment confirmed by webhook"
        );
        Ok(HandleGatewayWebhookResult::PaymentSettled {
            payment_id: payment.id,
            credits_added: settlement.credits_added,
        })
    }
}
