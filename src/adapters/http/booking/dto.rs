//! HTTP DTOs (Data Transfer Objects) for booking endpoints.
//!
//! These types define the JSON request/response structure of the API.
//! Domain aggregates serialize as-is inside the response envelopes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    CancelReservationResult, CancelSessionResult, ConfirmPaymentResult, CreatePaymentResult,
    CreateReservationResult, ExpireStalePaymentsResult, HandleGatewayWebhookResult,
    MarkPaymentPaidResult, RescheduleSessionResult, Settlement,
};
use crate::domain::foundation::{
    EmployeeId, LocationId, MemberId, PaymentId, ServiceId, SessionId, Timestamp,
};
use crate::domain::payment::Payment;
use crate::domain::reservation::Reservation;
use crate::domain::scheduling::Session;

// ════════════════════════════════════════════════════════════════════════════════
// Query Parameters
// ════════════════════════════════════════════════════════════════════════════════

/// Staff may look at another member's balances.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberParams {
    pub member_id: Option<MemberId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionListParams {
    pub service_id: Option<ServiceId>,
    /// Calendar day (UTC) the session starts on.
    pub date: Option<NaiveDate>,
}

/// Gateway redirects carry the reference as `session_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentParams {
    #[serde(alias = "session_id")]
    pub reference: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservationRequest {
    pub member_id: MemberId,
    pub session_id: SessionId,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Staff edit of a reservation. Member and session are echoed back for a
/// consistency check and cannot change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReservationRequest {
    #[serde(default)]
    pub member_id: Option<MemberId>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSessionRequest {
    pub location_id: LocationId,
    pub service_id: ServiceId,
    pub trainer_id: EmployeeId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub capacity: i32,
}

/// Full replacement of the mutable schedule fields.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleSessionRequest {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub capacity: i32,
    /// Keeps the current trainer when omitted.
    #[serde(default)]
    pub trainer_id: Option<EmployeeId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    /// Defaults to the calling member.
    #[serde(default)]
    pub member_id: Option<MemberId>,
    pub service_id: ServiceId,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePaymentRequest {
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub external_ref: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ReservationResponse {
    pub reservation: Reservation,
    pub current_bookings: i64,
    pub remaining_credits: i32,
}

impl From<CreateReservationResult> for ReservationResponse {
    fn from(result: CreateReservationResult) -> Self {
        Self {
            reservation: result.reservation,
            current_bookings: result.current_bookings,
            remaining_credits: result.remaining_credits,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelReservationResponse {
    pub reservation: Reservation,
    /// Whether this call returned a credit to the member.
    pub refunded: bool,
}

impl From<CancelReservationResult> for CancelReservationResponse {
    fn from(result: CancelReservationResult) -> Self {
        Self {
            reservation: result.reservation,
            refunded: result.refunded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_bookings: Option<i64>,
}

impl From<RescheduleSessionResult> for SessionResponse {
    fn from(result: RescheduleSessionResult) -> Self {
        Self {
            session: result.session,
            current_bookings: Some(result.active_count),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelSessionResponse {
    pub session: Session,
    pub cancelled_reservations: usize,
    pub refunded_credits: usize,
}

impl From<CancelSessionResult> for CancelSessionResponse {
    fn from(result: CancelSessionResult) -> Self {
        Self {
            session: result.session,
            cancelled_reservations: result.cancelled_reservations,
            refunded_credits: result.refunded_credits,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub payment: Payment,
    pub checkout_url: String,
}

impl From<CreatePaymentResult> for CheckoutResponse {
    fn from(result: CreatePaymentResult) -> Self {
        Self {
            payment: result.payment,
            checkout_url: result.checkout_url,
        }
    }
}

/// Payment state after a settlement attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSettlementResponse {
    pub payment: Payment,
    /// True if this call moved the payment to PAID.
    pub newly_paid: bool,
    /// Credits issued by this call, if any.
    pub credits_added: Option<i32>,
}

impl PaymentSettlementResponse {
    fn new(payment: Payment, settlement: Option<Settlement>) -> Self {
        Self {
            payment,
            newly_paid: settlement.map(|s| s.newly_paid).unwrap_or(false),
            credits_added: settlement.and_then(|s| s.credits_added),
        }
    }
}

impl From<MarkPaymentPaidResult> for PaymentSettlementResponse {
    fn from(result: MarkPaymentPaidResult) -> Self {
        Self::new(result.payment, Some(result.settlement))
    }
}

impl From<ConfirmPaymentResult> for PaymentSettlementResponse {
    fn from(result: ConfirmPaymentResult) -> Self {
        Self::new(result.payment, result.settlement)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpireStaleResponse {
    pub expired: Vec<PaymentId>,
    pub count: usize,
}

impl From<ExpireStalePaymentsResult> for ExpireStaleResponse {
    fn from(result: ExpireStalePaymentsResult) -> Self {
        Self {
            count: result.expired.len(),
            expired: result.expired,
        }
    }
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<PaymentId>,
}

impl From<HandleGatewayWebhookResult> for WebhookAckResponse {
    fn from(result: HandleGatewayWebhookResult) -> Self {
        let (outcome, payment_id) = match result {
            HandleGatewayWebhookResult::PaymentSettled { payment_id, .. } => {
                ("payment_settled", Some(payment_id))
            }
            HandleGatewayWebhookResult::AlreadySettled { payment_id } => {
                ("already_settled", Some(payment_id))
            }
            HandleGatewayWebhookResult::AwaitingPayment { .. } => ("awaiting_payment", None),
            HandleGatewayWebhookResult::Unmatched { .. } => ("unmatched", None),
            HandleGatewayWebhookResult::Acknowledged { .. } => ("ignored", None),
        };
        Self {
            received: true,
            outcome,
            payment_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_params_accept_gateway_alias() {
        let params: ConfirmPaymentParams =
            serde_json::from_value(serde_json::json!({"session_id": "cs_test_1"})).unwrap();
        assert_eq!(params.reference, "cs_test_1");
    }

    #[test]
    fn create_payment_request_defaults_optional_fields() {
        let service_id = ServiceId::new();
        let request: CreatePaymentRequest =
            serde_json::from_value(serde_json::json!({"service_id": service_id})).unwrap();
        assert_eq!(request.service_id, service_id);
        assert!(request.member_id.is_none());
        assert!(request.quantity.is_none());
    }

    #[test]
    fn schedule_request_parses_rfc3339_times() {
        let request: ScheduleSessionRequest = serde_json::from_value(serde_json::json!({
            "location_id": LocationId::new(),
            "service_id": ServiceId::new(),
            "trainer_id": EmployeeId::new(),
            "starts_at": "2026-03-01T09:00:00Z",
            "ends_at": "2026-03-01T10:00:00Z",
            "capacity": 12
        }))
        .unwrap();
        assert!(request.starts_at.is_before(&request.ends_at));
    }

    #[test]
    fn webhook_ack_hides_unmatched_reference() {
        let ack = WebhookAckResponse::from(HandleGatewayWebhookResult::Unmatched {
            reference: "cs_unknown".to_string(),
        });
        let json = serde_json::to_value(ack).unwrap();
        assert_eq!(json["outcome"], "unmatched");
        assert!(json.get("payment_id").is_none());
    }

    #[test]
    fn settlement_response_without_settlement_reports_nothing_new() {
        let payment = Payment::create_pending(
            PaymentId::new(),
            MemberId::new(),
            ServiceId::new(),
            1,
            1500,
            "EUR",
        )
        .unwrap();
        let response = PaymentSettlementResponse::new(payment, None);
        assert!(!response.newly_paid);
        assert_eq!(response.credits_added, None);
    }
}
