//! HTTP error mapping for booking errors.
//!
//! Every handler returns `ApiError`, which renders a `BookingError` as a
//! status code plus a stable machine-readable code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BookingError, DomainError};

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling, e.g. `SESSION_FULL`.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type that converts booking errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub BookingError);

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(BookingError::from(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            BookingError::InvalidState { .. } => StatusCode::CONFLICT,
            BookingError::UpstreamFailure { retryable: true, .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            BookingError::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let BookingError::Infrastructure(detail) = &self.0 {
            tracing::error!(error = %detail, "Request failed");
        }

        let mut body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        if let BookingError::InsufficientCredits {
            available,
            requested,
        } = &self.0
        {
            body = body.with_details(serde_json::json!({
                "available": available,
                "requested": requested,
            }));
        }

        (status, Json(body)).into_response()
    }
}
