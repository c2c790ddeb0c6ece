//! Stripe payment gateway adapter.
//!
//! Implements `PaymentGateway` over the Stripe Checkout API: one-off
//! `payment` mode sessions with inline price data, session status lookups,
//! and signed webhook verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret)
//!     .with_request_timeout(Duration::from_secs(10));
//! let gateway = StripePaymentGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::{
    CheckoutRequest, CheckoutSession, GatewayError, GatewayErrorCode, GatewayPaymentStatus,
    PaymentGateway, WebhookEvent, WebhookEventKind,
};

use super::webhook_types::{
    SignatureHeader, StripeCheckoutSession, StripeErrorBody, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    api_base_url: String,

    /// Reject test mode events.
    require_livemode: bool,

    /// Per-request timeout on the HTTP client.
    request_timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            require_livemode: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Stripe Checkout gateway.
pub struct StripePaymentGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentGateway {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built (e.g. TLS backend missing).
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Verify webhook signature using HMAC-SHA256.
    ///
    /// Any `v1` entry of the header may match.
    fn verify_signature(&self, payload: &[u8], header: &SignatureHeader) -> Result<(), GatewayError> {
        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(GatewayError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(GatewayError::invalid_webhook("Event timestamp in future"));
        }

        // 2. Compute expected signature over "{t}.{payload}"
        let mut mac =
            HmacSha256::new_from_slice(self.config.webhook_secret.expose_secret().as_bytes())
                .map_err(|_| GatewayError::invalid_webhook("Unusable webhook secret"))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison
        let matched = header
            .v1_signatures
            .iter()
            .any(|provided| expected.as_slice().ct_eq(provided.as_slice()).into());

        if !matched {
            tracing::warn!(
                signatures = header.v1_signatures.len(),
                "Invalid webhook signature"
            );
            return Err(GatewayError::invalid_webhook("Invalid signature"));
        }

        Ok(())
    }

    /// Parse a verified payload into a gateway-neutral event.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, GatewayError> {
        let stripe_event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            GatewayError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;

        if self.config.require_livemode && !stripe_event.livemode {
            tracing::warn!(
                event_id = %stripe_event.id,
                "Rejected test mode event in production"
            );
            return Err(GatewayError::invalid_webhook(
                "Test mode events not allowed in production",
            ));
        }

        let kind = match stripe_event.event_type.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                let session: StripeCheckoutSession =
                    serde_json::from_value(stripe_event.data.object.clone()).map_err(|e| {
                        GatewayError::invalid_webhook(format!("Invalid checkout session: {}", e))
                    })?;
                WebhookEventKind::CheckoutCompleted {
                    payment_status: GatewayPaymentStatus::from_provider(
                        session.payment_status.as_deref().unwrap_or_default(),
                    ),
                    reference: session.id,
                }
            }
            other => WebhookEventKind::Other(other.to_string()),
        };

        Ok(WebhookEvent {
            id: stripe_event.id,
            kind,
            created_at: stripe_event.created,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .http_client
            .post(self.endpoint("/v1/checkout/sessions"))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&checkout_form(&request))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(response_error(response).await);
        }

        let stripe_session: StripeCheckoutSession = response.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let url = stripe_session
            .url
            .ok_or_else(|| GatewayError::provider("Stripe returned a checkout session without URL"))?;

        tracing::debug!(
            payment_id = %request.payment_id,
            reference = %stripe_session.id,
            "Stripe checkout session created"
        );

        Ok(CheckoutSession {
            reference: stripe_session.id,
            url,
        })
    }

    async fn retrieve_payment_status(
        &self,
        reference: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError> {
        if reference.is_empty() || reference.contains('/') {
            return Err(GatewayError::not_found("Checkout session"));
        }

        let response = self
            .http_client
            .get(self.endpoint(&format!("/v1/checkout/sessions/{}", reference)))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(response_error(response).await);
        }

        let stripe_session: StripeCheckoutSession = response.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(GatewayPaymentStatus::from_provider(
            stripe_session.payment_status.as_deref().unwrap_or_default(),
        ))
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent, GatewayError> {
        // 1. Parse signature header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            GatewayError::invalid_webhook(e.to_string())
        })?;

        // 2. Verify signature (includes timestamp validation)
        self.verify_signature(payload, &header)?;

        // 3. Parse and convert event
        let event = self.parse_event(payload)?;

        tracing::info!(event_id = %event.id, "Webhook signature verified");

        Ok(event)
    }
}

/// Form body for a one-line `payment` mode checkout.
fn checkout_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "payment".to_string()),
        ("client_reference_id", request.payment_id.to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("line_items[0][quantity]", request.line_quantity.to_string()),
        (
            "line_items[0][price_data][currency]",
            request.currency.to_lowercase(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            request.unit_amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.product_name.clone(),
        ),
        ("metadata[payment_id]", request.payment_id.to_string()),
        ("metadata[member_id]", request.member_id.to_string()),
        ("metadata[service_id]", request.service_id.to_string()),
        ("metadata[quantity]", request.credit_quantity.to_string()),
    ]
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::timeout(format!("Stripe request timed out: {}", err))
    } else {
        GatewayError::network(format!("Stripe request failed: {}", err))
    }
}

async fn response_error(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, &body)
}

/// Map a non-success Stripe response to a gateway error.
fn classify_status(status: u16, body: &str) -> GatewayError {
    let message = serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => GatewayError::authentication(message),
        404 => GatewayError::new(GatewayErrorCode::NotFound, message),
        429 => GatewayError::new(GatewayErrorCode::RateLimitExceeded, message),
        500..=599 => GatewayError::network(format!("Stripe unavailable ({}): {}", status, message)),
        _ => GatewayError::provider(format!("Stripe API error ({}): {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MemberId, PaymentId, ServiceId};

    const SECRET: &str = "whsec_test_secret";

    fn test_gateway() -> StripePaymentGateway {
        StripePaymentGateway::new(StripeConfig::new("sk_test_key", SECRET)).unwrap()
    }

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        let result = mac.finalize().into_bytes();
        format!("t={},v1={}", timestamp, hex::encode(result))
    }

    fn completed_payload(reference: &str, payment_status: &str, livemode: bool) -> String {
        format!(
            r#"{{
                "id": "evt_test123",
                "type": "checkout.session.completed",
                "created": 1704067200,
                "data": {{
                    "object": {{
                        "id": "{}",
                        "object": "checkout.session",
                        "payment_status": "{}",
                        "status": "complete",
                        "mode": "payment",
                        "metadata": {{"quantity": "3"}}
                    }}
                }},
                "livemode": {},
                "pending_webhooks": 0
            }}"#,
            reference, payment_status, livemode
        )
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn config_new_sets_defaults() {
        let config = StripeConfig::new("api_key", "webhook_secret");
        assert_eq!(config.api_base_url, "https://api.stripe.com");
        assert!(!config.require_livemode);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn config_with_base_url_strips_trailing_slash() {
        let config = StripeConfig::new("key", "secret").with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn verify_signature_valid() {
        let gateway = test_gateway();
        let payload = r#"{"id":"evt_test"}"#;
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        assert!(gateway.verify_signature(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_signature_wrong_secret() {
        let gateway = test_gateway();
        let payload = r#"{"id":"evt_test"}"#;
        let signature = sign("whsec_other", chrono::Utc::now().timestamp(), payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        let err = gateway
            .verify_signature(payload.as_bytes(), &header)
            .unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::InvalidWebhook);
        assert!(!err.retryable);
    }

    #[test]
    fn verify_signature_tampered_payload() {
        let gateway = test_gateway();
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), r#"{"amount":1}"#);

        let header = SignatureHeader::parse(&signature).unwrap();
        assert!(gateway
            .verify_signature(br#"{"amount":9}"#, &header)
            .is_err());
    }

    #[test]
    fn verify_signature_expired_timestamp() {
        let gateway = test_gateway();
        let payload = r#"{"id":"evt_test"}"#;
        let old = chrono::Utc::now().timestamp() - 301;
        let signature = sign(SECRET, old, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        let err = gateway
            .verify_signature(payload.as_bytes(), &header)
            .unwrap_err();
        assert!(err.message.contains("too old"));
    }

    #[test]
    fn verify_signature_future_timestamp() {
        let gateway = test_gateway();
        let payload = r#"{"id":"evt_test"}"#;
        let future = chrono::Utc::now().timestamp() + 120;
        let signature = sign(SECRET, future, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        assert!(gateway.verify_signature(payload.as_bytes(), &header).is_err());
    }

    #[test]
    fn verify_signature_small_future_tolerance() {
        let gateway = test_gateway();
        let payload = r#"{"id":"evt_test"}"#;
        let near_future = chrono::Utc::now().timestamp() + 30;
        let signature = sign(SECRET, near_future, payload);

        let header = SignatureHeader::parse(&signature).unwrap();
        assert!(gateway.verify_signature(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_signature_accepts_any_rolled_secret() {
        let gateway = test_gateway();
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let stale = sign("whsec_old", timestamp, payload);
        let current = sign(SECRET, timestamp, payload);
        let current_v1 = current.split(",v1=").nth(1).unwrap();

        let header = SignatureHeader::parse(&format!("{},v1={}", stale, current_v1)).unwrap();
        assert_eq!(header.v1_signatures.len(), 2);
        assert!(gateway.verify_signature(payload.as_bytes(), &header).is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // verify_webhook full flow
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn verify_webhook_maps_checkout_completed() {
        let gateway = test_gateway();
        let payload = completed_payload("cs_test_abc", "paid", false);
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), &payload);

        let event = gateway
            .verify_webhook(payload.as_bytes(), &signature)
            .unwrap();

        assert_eq!(event.id, "evt_test123");
        assert_eq!(event.created_at, 1704067200);
        assert_eq!(
            event.kind,
            WebhookEventKind::CheckoutCompleted {
                reference: "cs_test_abc".to_string(),
                payment_status: GatewayPaymentStatus::Paid,
            }
        );
    }

    #[test]
    fn verify_webhook_carries_unpaid_status() {
        let gateway = test_gateway();
        let payload = completed_payload("cs_test_abc", "unpaid", false);
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), &payload);

        let event = gateway
            .verify_webhook(payload.as_bytes(), &signature)
            .unwrap();
        assert!(matches!(
            event.kind,
            WebhookEventKind::CheckoutCompleted {
                payment_status: GatewayPaymentStatus::Unpaid,
                ..
            }
        ));
    }

    #[test]
    fn verify_webhook_passes_through_other_events() {
        let gateway = test_gateway();
        let payload = r#"{
            "id": "evt_2",
            "type": "charge.refunded",
            "created": 1704067200,
            "data": {"object": {"id": "ch_1"}},
            "livemode": false
        }"#;
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), payload);

        let event = gateway
            .verify_webhook(payload.as_bytes(), &signature)
            .unwrap();
        assert_eq!(
            event.kind,
            WebhookEventKind::Other("charge.refunded".to_string())
        );
    }

    #[test]
    fn verify_webhook_rejects_test_mode_when_live_required() {
        let gateway = StripePaymentGateway::new(
            StripeConfig::new("sk_live_key", SECRET).with_require_livemode(true),
        )
        .unwrap();
        let payload = completed_payload("cs_test_abc", "paid", false);
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), &payload);

        let err = gateway
            .verify_webhook(payload.as_bytes(), &signature)
            .unwrap_err();
        assert!(err.message.contains("Test mode"));
    }

    #[test]
    fn verify_webhook_rejects_malformed_header() {
        let gateway = test_gateway();
        let result = gateway.verify_webhook(br#"{"id":"evt_test"}"#, "malformed_header");
        assert!(result.is_err());
    }

    #[test]
    fn verify_webhook_rejects_invalid_json() {
        let gateway = test_gateway();
        let payload = "not valid json";
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), payload);

        let err = gateway
            .verify_webhook(payload.as_bytes(), &signature)
            .unwrap_err();
        assert!(err.message.contains("Invalid JSON"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Request / Response Mapping
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn checkout_form_carries_price_data_and_metadata() {
        let request = CheckoutRequest {
            payment_id: PaymentId::new(),
            member_id: MemberId::new(),
            service_id: ServiceId::new(),
            product_name: "Yoga credit".to_string(),
            unit_amount_cents: 1500,
            line_quantity: 3,
            credit_quantity: 3,
            currency: "EUR".to_string(),
            success_url: "https://studio.test/ok".to_string(),
            cancel_url: "https://studio.test/cancel".to_string(),
        };

        let form = checkout_form(&request);
        let field = |name: &str| {
            form.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        };

        assert_eq!(field("mode").as_deref(), Some("payment"));
        assert_eq!(field("line_items[0][quantity]").as_deref(), Some("3"));
        assert_eq!(
            field("line_items[0][price_data][currency]").as_deref(),
            Some("eur")
        );
        assert_eq!(
            field("line_items[0][price_data][unit_amount]").as_deref(),
            Some("1500")
        );
        assert_eq!(
            field("metadata[payment_id]"),
            Some(request.payment_id.to_string())
        );
        assert_eq!(field("metadata[quantity]").as_deref(), Some("3"));
    }

    #[test]
    fn classify_status_uses_stripe_error_message() {
        let body = r#"{"error": {"message": "No such checkout.session", "type": "invalid_request_error"}}"#;
        let err = classify_status(404, body);
        assert_eq!(err.code, GatewayErrorCode::NotFound);
        assert_eq!(err.message, "No such checkout.session");
    }

    #[test]
    fn classify_status_marks_retryable_failures() {
        assert!(classify_status(429, "").retryable);
        assert!(classify_status(503, "upstream").retryable);
        assert!(!classify_status(401, "").retryable);
        assert!(!classify_status(400, "bad").retryable);
        assert_eq!(
            classify_status(401, "").code,
            GatewayErrorCode::AuthenticationError
        );
    }
}
