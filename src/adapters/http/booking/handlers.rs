//! HTTP handlers for booking endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::{
    BookSessionCommand, BookSessionHandler, CancelReservationCommand, CancelReservationHandler,
    CancelSessionCommand, CancelSessionHandler, CheckoutSettings, ConfirmPaymentCommand,
    ConfirmPaymentHandler, CreatePaymentCommand, CreatePaymentHandler, CreateReservationCommand,
    CreateReservationHandler, ExpireStalePaymentsCommand, ExpireStalePaymentsHandler,
    GetMemberCreditsHandler, GetMemberCreditsQuery, GetPaymentHandler, GetPaymentQuery,
    GetReservationHandler, GetReservationQuery, HandleGatewayWebhookCommand,
    HandleGatewayWebhookHandler, ListAvailableSessionsHandler, ListAvailableSessionsQuery,
    ListMemberReservationsHandler, ListMemberReservationsQuery, ListPaymentsHandler,
    ListPaymentsQuery, ListReservationsHandler, ListReservationsQuery, MarkPaymentPaidCommand,
    MarkPaymentPaidHandler, RescheduleSessionCommand, RescheduleSessionHandler,
    ScheduleSessionCommand, ScheduleSessionHandler, UpdatePaymentCommand, UpdatePaymentHandler,
    UpdateReservationCommand, UpdateReservationHandler,
};
use crate::domain::foundation::{
    Actor, BookingError, MemberId, PaymentId, ReservationId, SessionId,
};
use crate::ports::{BookingReader, BookingUnitOfWork, Directory, PaymentGateway};

use super::super::error::{ApiError, ErrorResponse};
use super::super::middleware::RequireActor;
use super::dto::{
    CancelReservationResponse, CancelSessionResponse, CheckoutResponse, ConfirmPaymentParams,
    CreatePaymentRequest, CreateReservationRequest, ExpireStaleResponse, MemberParams,
    PaymentSettlementResponse, ReservationResponse, RescheduleSessionRequest,
    ScheduleSessionRequest, SessionListParams, SessionResponse, UpdatePaymentRequest,
    UpdateReservationRequest, WebhookAckResponse,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; handlers are built on demand from the
/// Arc-wrapped ports.
#[derive(Clone)]
pub struct BookingAppState {
    pub uow: Arc<dyn BookingUnitOfWork>,
    pub reader: Arc<dyn BookingReader>,
    pub directory: Arc<dyn Directory>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub checkout: CheckoutSettings,
    pub pending_payment_ttl_hours: i64,
}

impl BookingAppState {
    pub fn member_credits_handler(&self) -> GetMemberCreditsHandler {
        GetMemberCreditsHandler::new(self.reader.clone(), self.directory.clone())
    }

    pub fn available_sessions_handler(&self) -> ListAvailableSessionsHandler {
        ListAvailableSessionsHandler::new(self.reader.clone(), self.directory.clone())
    }

    pub fn book_session_handler(&self) -> BookSessionHandler {
        BookSessionHandler::new(self.uow.clone())
    }

    pub fn create_reservation_handler(&self) -> CreateReservationHandler {
        CreateReservationHandler::new(self.uow.clone(), self.directory.clone())
    }

    pub fn cancel_reservation_handler(&self) -> CancelReservationHandler {
        CancelReservationHandler::new(self.uow.clone())
    }

    pub fn get_reservation_handler(&self) -> GetReservationHandler {
        GetReservationHandler::new(self.reader.clone())
    }

    pub fn member_reservations_handler(&self) -> ListMemberReservationsHandler {
        ListMemberReservationsHandler::new(self.reader.clone())
    }

    pub fn list_reservations_handler(&self) -> ListReservationsHandler {
        ListReservationsHandler::new(self.reader.clone())
    }

    pub fn update_reservation_handler(&self) -> UpdateReservationHandler {
        UpdateReservationHandler::new(self.uow.clone())
    }

    pub fn schedule_session_handler(&self) -> ScheduleSessionHandler {
        ScheduleSessionHandler::new(self.uow.clone(), self.directory.clone())
    }

    pub fn reschedule_session_handler(&self) -> RescheduleSessionHandler {
        RescheduleSessionHandler::new(self.uow.clone(), self.directory.clone())
    }

    pub fn cancel_session_handler(&self) -> CancelSessionHandler {
        CancelSessionHandler::new(self.uow.clone())
    }

    pub fn create_payment_handler(&self) -> CreatePaymentHandler {
        CreatePaymentHandler::new(
            self.uow.clone(),
            self.directory.clone(),
            self.gateway.clone(),
            self.checkout.clone(),
        )
    }

    pub fn get_payment_handler(&self) -> GetPaymentHandler {
        GetPaymentHandler::new(self.reader.clone())
    }

    pub fn list_payments_handler(&self) -> ListPaymentsHandler {
        ListPaymentsHandler::new(self.reader.clone())
    }

    pub fn update_payment_handler(&self) -> UpdatePaymentHandler {
        UpdatePaymentHandler::new(self.uow.clone())
    }

    pub fn mark_payment_paid_handler(&self) -> MarkPaymentPaidHandler {
        MarkPaymentPaidHandler::new(self.uow.clone())
    }

    pub fn confirm_payment_handler(&self) -> ConfirmPaymentHandler {
        ConfirmPaymentHandler::new(
            self.uow.clone(),
            self.reader.clone(),
            self.gateway.clone(),
            self.checkout.gateway_timeout,
        )
    }

    pub fn expire_stale_payments_handler(&self) -> ExpireStalePaymentsHandler {
        ExpireStalePaymentsHandler::new(self.uow.clone(), self.pending_payment_ttl_hours)
    }

    pub fn webhook_handler(&self) -> HandleGatewayWebhookHandler {
        HandleGatewayWebhookHandler::new(self.uow.clone(), self.gateway.clone())
    }
}

/// Member a request acts on: the explicit one, else the calling member.
fn target_member(actor: &Actor, explicit: Option<MemberId>) -> Result<MemberId, ApiError> {
    explicit.or_else(|| actor.member_id()).ok_or_else(|| {
        ApiError(BookingError::invalid_argument(
            "member_id",
            "member_id is required for staff requests",
        ))
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Member Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/member/credits - Credit balances per service
pub async fn get_member_credits(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<MemberParams>,
) -> Result<impl IntoResponse, ApiError> {
    let member_id = target_member(&actor, params.member_id)?;
    let view = state
        .member_credits_handler()
        .handle(GetMemberCreditsQuery { actor, member_id })
        .await?;
    Ok(Json(view))
}

/// GET /api/member/sessions - Upcoming sessions with free seats
pub async fn list_available_sessions(
    State(state): State<BookingAppState>,
    RequireActor(_actor): RequireActor,
    Query(params): Query<SessionListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state
        .available_sessions_handler()
        .handle(ListAvailableSessionsQuery {
            service_id: params.service_id,
            date: params.date,
        })
        .await?;
    Ok(Json(sessions))
}

/// POST /api/member/sessions/:id/book - Book a seat with one credit
pub async fn book_session(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(session_id): Path<SessionId>,
    Query(params): Query<MemberParams>,
) -> Result<impl IntoResponse, ApiError> {
    let member_id = target_member(&actor, params.member_id)?;
    let confirmation = state
        .book_session_handler()
        .handle(BookSessionCommand {
            actor,
            member_id,
            session_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// GET /api/member/reservations - Reservations of a member
pub async fn list_member_reservations(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<MemberParams>,
) -> Result<impl IntoResponse, ApiError> {
    let member_id = target_member(&actor, params.member_id)?;
    let reservations = state
        .member_reservations_handler()
        .handle(ListMemberReservationsQuery { actor, member_id })
        .await?;
    Ok(Json(reservations))
}

// ════════════════════════════════════════════════════════════════════════════════
// Reservation Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/reservations - Create a reservation
pub async fn create_reservation(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Json(request): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .create_reservation_handler()
        .handle(CreateReservationCommand {
            actor,
            member_id: request.member_id,
            session_id: request.session_id,
            payment_id: request.payment_id,
            note: request.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ReservationResponse::from(result))))
}

/// GET /api/reservations - All reservations (staff)
pub async fn list_reservations(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
) -> Result<impl IntoResponse, ApiError> {
    let reservations = state
        .list_reservations_handler()
        .handle(ListReservationsQuery { actor })
        .await?;
    Ok(Json(reservations))
}

/// PUT /api/reservations/:id - Edit note and attached payment (staff)
pub async fn update_reservation(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(reservation_id): Path<ReservationId>,
    Json(request): Json<UpdateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reservation = state
        .update_reservation_handler()
        .handle(UpdateReservationCommand {
            actor,
            reservation_id,
            member_id: request.member_id,
            session_id: request.session_id,
            payment_id: request.payment_id,
            note: request.note,
        })
        .await?;
    Ok(Json(reservation))
}

/// GET /api/reservations/:id
pub async fn get_reservation(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(reservation_id): Path<ReservationId>,
) -> Result<impl IntoResponse, ApiError> {
    let reservation = state
        .get_reservation_handler()
        .handle(GetReservationQuery {
            actor,
            reservation_id,
        })
        .await?;
    Ok(Json(reservation))
}

/// PATCH /api/reservations/:id/cancel - Cancel and refund the credit
pub async fn cancel_reservation(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(reservation_id): Path<ReservationId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .cancel_reservation_handler()
        .handle(CancelReservationCommand {
            actor,
            reservation_id,
        })
        .await?;
    Ok(Json(CancelReservationResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Session Endpoints (staff)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Schedule a session
pub async fn schedule_session(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Json(request): Json<ScheduleSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .schedule_session_handler()
        .handle(ScheduleSessionCommand {
            actor,
            location_id: request.location_id,
            service_id: request.service_id,
            trainer_id: request.trainer_id,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            capacity: request.capacity,
        })
        .await?;
    let response = SessionResponse {
        session: result.session,
        current_bookings: None,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /api/sessions/:id - Move, resize or reassign a session
pub async fn reschedule_session(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(session_id): Path<SessionId>,
    Json(request): Json<RescheduleSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .reschedule_session_handler()
        .handle(RescheduleSessionCommand {
            actor,
            session_id,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            capacity: request.capacity,
            trainer_id: request.trainer_id,
        })
        .await?;
    Ok(Json(SessionResponse::from(result)))
}

/// PATCH /api/sessions/:id/cancel - Cancel a session and refund its bookings
pub async fn cancel_session(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(session_id): Path<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .cancel_session_handler()
        .handle(CancelSessionCommand { actor, session_id })
        .await?;
    Ok(Json(CancelSessionResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments - Start a credit purchase
pub async fn create_payment(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member_id = target_member(&actor, request.member_id)?;
    let result = state
        .create_payment_handler()
        .handle(CreatePaymentCommand {
            actor,
            member_id,
            service_id: request.service_id,
            quantity: request.quantity,
            amount_cents: request.amount_cents,
            currency: request.currency,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(result))))
}

/// GET /api/payments - Own payments, or any member's for staff
pub async fn list_payments(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<MemberParams>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = state
        .list_payments_handler()
        .handle(ListPaymentsQuery {
            actor,
            member_id: params.member_id,
        })
        .await?;
    Ok(Json(payments))
}

/// GET /api/payments/:id
pub async fn get_payment(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(payment_id): Path<PaymentId>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state
        .get_payment_handler()
        .handle(GetPaymentQuery { actor, payment_id })
        .await?;
    Ok(Json(payment))
}

/// PUT /api/payments/:id - Admin correction of a payment
pub async fn update_payment(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(payment_id): Path<PaymentId>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state
        .update_payment_handler()
        .handle(UpdatePaymentCommand {
            actor,
            payment_id,
            quantity: request.quantity,
            amount_cents: request.amount_cents,
            currency: request.currency,
            external_ref: request.external_ref,
        })
        .await?;
    Ok(Json(payment))
}

/// PATCH /api/payments/:id/mark-paid - Manual settlement
pub async fn mark_payment_paid(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Path(payment_id): Path<PaymentId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .mark_payment_paid_handler()
        .handle(MarkPaymentPaidCommand { actor, payment_id })
        .await?;
    Ok(Json(PaymentSettlementResponse::from(result)))
}

/// GET /api/payments/confirm?session_id=... - Checkout return poll
pub async fn confirm_payment(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
    Query(params): Query<ConfirmPaymentParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .confirm_payment_handler()
        .handle(ConfirmPaymentCommand {
            actor,
            reference: params.reference,
        })
        .await?;
    Ok(Json(PaymentSettlementResponse::from(result)))
}

/// POST /api/payments/expire-stale - Expire abandoned checkouts
pub async fn expire_stale_payments(
    State(state): State<BookingAppState>,
    RequireActor(actor): RequireActor,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .expire_stale_payments_handler()
        .handle(ExpireStalePaymentsCommand { actor })
        .await?;
    Ok(Json(ExpireStaleResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks (no actor, signature verified)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Gateway payment notifications
///
/// Signature failures answer 400; transient failures answer 5xx and are
/// retried by the gateway.
pub async fn handle_stripe_webhook(
    State(state): State<BookingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return ApiError(BookingError::invalid_argument(
            "Stripe-Signature",
            "Missing Stripe-Signature header",
        ))
        .into_response();
    };

    let cmd = HandleGatewayWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    match state.webhook_handler().handle(cmd).await {
        Ok(result) => Json(WebhookAckResponse::from(result)).into_response(),
        Err(BookingError::UpstreamFailure {
            message,
            retryable: false,
        }) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("INVALID_WEBHOOK_SIGNATURE", message)),
        )
            .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}
