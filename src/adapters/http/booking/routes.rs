//! Axum router configuration for booking endpoints.

use axum::routing::{get, patch, post, put};
use axum::Router;

use super::handlers::{
    book_session, cancel_reservation, cancel_session, confirm_payment, create_payment,
    create_reservation, expire_stale_payments, get_member_credits, get_payment, get_reservation,
    handle_stripe_webhook, list_available_sessions, list_member_reservations, list_payments,
    list_reservations, mark_payment_paid, reschedule_session, schedule_session, update_payment,
    update_reservation, BookingAppState,
};

/// Member-facing endpoints.
///
/// # Routes
/// - `GET /credits` - Credit balances per service
/// - `GET /sessions` - Upcoming sessions with free seats
/// - `POST /sessions/:id/book` - Book a seat with one credit
/// - `GET /reservations` - Own reservations
pub fn member_routes() -> Router<BookingAppState> {
    Router::new()
        .route("/credits", get(get_member_credits))
        .route("/sessions", get(list_available_sessions))
        .route("/sessions/:id/book", post(book_session))
        .route("/reservations", get(list_member_reservations))
}

/// # Routes
/// - `POST /` - Create a reservation (member for self, or staff)
/// - `GET /` - All reservations (staff)
/// - `GET /:id` - Reservation details
/// - `PUT /:id` - Edit note and attached payment (staff)
/// - `PATCH /:id/cancel` - Cancel and refund
pub fn reservation_routes() -> Router<BookingAppState> {
    Router::new()
        .route("/", post(create_reservation).get(list_reservations))
        .route("/:id", get(get_reservation).put(update_reservation))
        .route("/:id/cancel", patch(cancel_reservation))
}

/// Staff scheduling endpoints.
///
/// # Routes
/// - `POST /` - Schedule a session
/// - `PUT /:id` - Reschedule a session
/// - `PATCH /:id/cancel` - Cancel a session
pub fn session_routes() -> Router<BookingAppState> {
    Router::new()
        .route("/", post(schedule_session))
        .route("/:id", put(reschedule_session))
        .route("/:id/cancel", patch(cancel_session))
}

/// # Routes
/// - `POST /` - Start a credit purchase
/// - `GET /` - List payments
/// - `GET /confirm` - Checkout return poll
/// - `POST /expire-stale` - Expire abandoned checkouts (staff)
/// - `GET /:id` - Payment details
/// - `PUT /:id` - Correct a payment (admin)
/// - `PATCH /:id/mark-paid` - Manual settlement (admin)
pub fn payment_routes() -> Router<BookingAppState> {
    Router::new()
        .route("/", post(create_payment).get(list_payments))
        .route("/confirm", get(confirm_payment))
        .route("/expire-stale", post(expire_stale_payments))
        .route("/:id", get(get_payment).put(update_payment))
        .route("/:id/mark-paid", patch(mark_payment_paid))
}

/// Gateway notifications. No identity, verified by signature.
pub fn webhook_routes() -> Router<BookingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Complete booking API, suitable for mounting at `/api`.
pub fn booking_router() -> Router<BookingAppState> {
    Router::new()
        .nest("/member", member_routes())
        .nest("/reservations", reservation_routes())
        .nest("/sessions", session_routes())
        .nest("/payments", payment_routes())
        .nest("/webhooks", webhook_routes())
}
