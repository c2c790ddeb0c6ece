//! HTTP adapters - REST API implementations.
//!
//! `app_router` assembles the complete application: health probe, booking
//! API under `/api`, identity middleware, and request tracing.

pub mod booking;
pub mod error;
pub mod health;
pub mod middleware;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use booking::{booking_router, BookingAppState};
pub use error::{ApiError, ErrorResponse};

/// Build the application router with shared state applied.
pub fn app_router(state: BookingAppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", booking_router())
        .layer(axum::middleware::from_fn(middleware::actor_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Studio;
    use crate::application::handlers::CheckoutSettings;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_public() {
        let studio = Studio::new().await;
        let state = BookingAppState {
            uow: studio.uow(),
            reader: studio.reader(),
            directory: studio.directory(),
            gateway: studio.gateway(),
            checkout: CheckoutSettings::default(),
            pending_payment_ttl_hours: 24,
        };

        let response = app_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
