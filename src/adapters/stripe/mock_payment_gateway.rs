//! Mock payment gateway for testing.
//!
//! Provides a configurable mock implementation of `PaymentGateway` for unit
//! and integration tests. Supports:
//! - Issued checkout tracking
//! - Marking references paid from the test
//! - Error injection per method
//! - Artificial latency for timeout tests
//! - Webhook event simulation

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    CheckoutRequest, CheckoutSession, GatewayError, GatewayPaymentStatus, PaymentGateway,
    WebhookEvent,
};

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// let checkout = gateway.create_checkout_session(request).await?;
///
/// // Simulate the member paying
/// gateway.mark_paid(&checkout.reference);
/// ```
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Gateway-side status by reference.
    statuses: HashMap<String, GatewayPaymentStatus>,

    /// Every checkout request received, in order.
    checkout_requests: Vec<CheckoutRequest>,

    /// Specific errors by method name.
    method_errors: HashMap<String, GatewayError>,

    /// Event returned by the next successful verification.
    next_webhook_event: Option<WebhookEvent>,

    reject_webhooks: bool,

    /// Sleep before answering any async call.
    latency: Option<Duration>,

    /// Status lookups received, in order.
    status_lookups: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().reject_webhooks = true;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Report `reference` as paid from now on.
    pub fn mark_paid(&self, reference: &str) {
        self.inner
            .lock()
            .unwrap()
            .statuses
            .insert(reference.to_string(), GatewayPaymentStatus::Paid);
    }

    /// Register a reference the mock did not issue itself.
    pub fn set_status(&self, reference: &str, status: GatewayPaymentStatus) {
        self.inner
            .lock()
            .unwrap()
            .statuses
            .insert(reference.to_string(), status);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        self.inner.lock().unwrap().method_errors.clear();
    }

    /// Set the webhook event to return on verification.
    pub fn set_webhook_event(&self, event: WebhookEvent) {
        self.inner.lock().unwrap().next_webhook_event = Some(event);
    }

    /// Delay every async call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().unwrap().latency = Some(latency);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// All checkout requests received so far.
    pub fn checkout_requests(&self) -> Vec<CheckoutRequest> {
        self.inner.lock().unwrap().checkout_requests.clone()
    }

    /// All status lookups received so far.
    pub fn status_lookups(&self) -> Vec<String> {
        self.inner.lock().unwrap().status_lookups.clone()
    }

    fn method_error(&self, method: &str) -> Option<GatewayError> {
        self.inner.lock().unwrap().method_errors.get(method).cloned()
    }

    async fn simulate_latency(&self) {
        let latency = self.inner.lock().unwrap().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        self.simulate_latency().await;
        if let Some(err) = self.method_error("create_checkout_session") {
            return Err(err);
        }

        let mut state = self.inner.lock().unwrap();
        let reference = format!("cs_test_{}", state.checkout_requests.len() + 1);
        state
            .statuses
            .insert(reference.clone(), GatewayPaymentStatus::Unpaid);
        state.checkout_requests.push(request);

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/pay/{}", reference),
            reference,
        })
    }

    async fn retrieve_payment_status(
        &self,
        reference: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError> {
        self.simulate_latency().await;
        if let Some(err) = self.method_error("retrieve_payment_status") {
            return Err(err);
        }

        let mut state = self.inner.lock().unwrap();
        state.status_lookups.push(reference.to_string());
        state
            .statuses
            .get(reference)
            .copied()
            .ok_or_else(|| GatewayError::not_found("checkout session"))
    }

    fn verify_webhook(&self, _payload: &[u8], _signature: &str) -> Result<WebhookEvent, GatewayError> {
        let mut state = self.inner.lock().unwrap();
        if state.reject_webhooks {
            return Err(GatewayError::invalid_webhook("Signature mismatch"));
        }
        state
            .next_webhook_event
            .take()
            .ok_or_else(|| GatewayError::invalid_webhook("No webhook event configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MemberId, PaymentId, ServiceId};
    use crate::ports::{GatewayErrorCode, WebhookEventKind};

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            payment_id: PaymentId::new(),
            member_id: MemberId::new(),
            service_id: ServiceId::new(),
            product_name: "Yoga credit".to_string(),
            unit_amount_cents: 1500,
            line_quantity: 1,
            credit_quantity: 1,
            currency: "EUR".to_string(),
            success_url: "https://studio.test/ok".to_string(),
            cancel_url: "https://studio.test/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn issued_checkouts_start_unpaid() {
        let gateway = MockPaymentGateway::new();
        let checkout = gateway.create_checkout_session(request()).await.unwrap();

        let status = gateway
            .retrieve_payment_status(&checkout.reference)
            .await
            .unwrap();
        assert_eq!(status, GatewayPaymentStatus::Unpaid);
        assert_eq!(gateway.checkout_requests().len(), 1);
    }

    #[tokio::test]
    async fn mark_paid_changes_reported_status() {
        let gateway = MockPaymentGateway::new();
        let checkout = gateway.create_checkout_session(request()).await.unwrap();
        gateway.mark_paid(&checkout.reference);

        let status = gateway
            .retrieve_payment_status(&checkout.reference)
            .await
            .unwrap();
        assert!(status.is_paid());
    }

    #[tokio::test]
    async fn method_errors_are_returned() {
        let gateway = MockPaymentGateway::new();
        gateway.set_method_error("create_checkout_session", GatewayError::network("down"));

        let err = gateway.create_checkout_session(request()).await.unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::NetworkError);
    }

    #[test]
    fn rejecting_mock_fails_verification() {
        let gateway = MockPaymentGateway::rejecting_webhooks();
        gateway.set_webhook_event(WebhookEvent {
            id: "evt_1".to_string(),
            kind: WebhookEventKind::Other("invoice.paid".to_string()),
            created_at: 0,
        });
        assert!(gateway.verify_webhook(b"{}", "sig").is_err());
    }
}
