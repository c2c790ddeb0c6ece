//! Booking engine error taxonomy.
//!
//! Every application operation returns `BookingError`. Business failures are
//! detected before any mutation, so a returned error always means the
//! enclosing transaction was rolled back.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | InvalidArgument | 400 |
//! | Conflict | 409 |
//! | InsufficientCredits | 402 |
//! | InvalidState | 409 |
//! | UpstreamFailure | 502 / 503 when retryable |
//! | Forbidden | 403 |
//! | Infrastructure | 500 |

use super::{DomainError, ErrorCode, ValidationError};

/// Why an operation collided with existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Member already holds an active reservation for the session.
    AlreadyBooked,
    /// Active reservations already reached the session capacity.
    SessionFull,
    /// Trainer has another scheduled session in the same window.
    TrainerOverlap,
    /// Another payment already carries this gateway reference.
    DuplicateExternalRef,
    /// New capacity would drop below the number of active reservations.
    CapacityBelowBookings,
    /// Attached payment has not been paid yet.
    PaymentNotPaid,
}

impl ConflictReason {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConflictReason::AlreadyBooked => ErrorCode::AlreadyBooked,
            ConflictReason::SessionFull => ErrorCode::SessionFull,
            ConflictReason::TrainerOverlap => ErrorCode::TrainerOverlap,
            ConflictReason::DuplicateExternalRef => ErrorCode::DuplicateExternalRef,
            ConflictReason::CapacityBelowBookings => ErrorCode::CapacityBelowBookings,
            ConflictReason::PaymentNotPaid => ErrorCode::PaymentNotPaid,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConflictReason::AlreadyBooked => "You already booked this session",
            ConflictReason::SessionFull => "Session is full",
            ConflictReason::TrainerOverlap => "Trainer already has a session in this time range",
            ConflictReason::DuplicateExternalRef => "External reference already exists",
            ConflictReason::CapacityBelowBookings => {
                "Capacity cannot be lower than the number of active reservations"
            }
            ConflictReason::PaymentNotPaid => "Payment is not paid",
        }
    }
}

/// Errors surfaced by booking, ledger, scheduling, and payment operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Referenced entity does not exist.
    NotFound { resource: &'static str, id: String },

    /// Malformed quantity, amount, time range, or ownership mismatch.
    InvalidArgument { field: String, message: String },

    /// Operation collides with existing state.
    Conflict(ConflictReason),

    /// Ledger balance is lower than the requested amount.
    InsufficientCredits { available: i32, requested: i32 },

    /// Entity is not in a state that allows the operation.
    InvalidState { current: String, attempted: String },

    /// Payment gateway unreachable, timed out, or rejected the request.
    UpstreamFailure { message: String, retryable: bool },

    /// Actor may not perform the operation.
    Forbidden(String),

    /// Unexpected storage or runtime failure.
    Infrastructure(String),
}

impl BookingError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        BookingError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        BookingError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(reason: ConflictReason) -> Self {
        BookingError::Conflict(reason)
    }

    pub fn insufficient_credits(available: i32, requested: i32) -> Self {
        BookingError::InsufficientCredits {
            available,
            requested,
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        BookingError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn upstream(message: impl Into<String>, retryable: bool) -> Self {
        BookingError::UpstreamFailure {
            message: message.into(),
            retryable,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        BookingError::Forbidden(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BookingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BookingError::NotFound { resource, .. } => match *resource {
                "session" => ErrorCode::SessionNotFound,
                "reservation" => ErrorCode::ReservationNotFound,
                "payment" => ErrorCode::PaymentNotFound,
                "member" => ErrorCode::MemberNotFound,
                "service" => ErrorCode::ServiceNotFound,
                "employee" => ErrorCode::EmployeeNotFound,
                "location" => ErrorCode::LocationNotFound,
                _ => ErrorCode::ValidationFailed,
            },
            BookingError::InvalidArgument { .. } => ErrorCode::ValidationFailed,
            BookingError::Conflict(reason) => reason.code(),
            BookingError::InsufficientCredits { .. } => ErrorCode::InsufficientCredits,
            BookingError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            BookingError::UpstreamFailure { .. } => ErrorCode::PaymentGatewayError,
            BookingError::Forbidden(_) => ErrorCode::Forbidden,
            BookingError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a user-facing error message.
    ///
    /// Infrastructure failures never leak their internal detail.
    pub fn message(&self) -> String {
        match self {
            BookingError::NotFound { resource, id } => {
                let mut name = resource.to_string();
                if let Some(first) = name.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                format!("{} not found: {}", name, id)
            }
            BookingError::InvalidArgument { field, message } => {
                format!("Invalid value for '{}': {}", field, message)
            }
            BookingError::Conflict(reason) => reason.description().to_string(),
            BookingError::InsufficientCredits {
                available,
                requested,
            } => format!(
                "Not enough credits: {} available, {} required",
                available, requested
            ),
            BookingError::InvalidState { current, attempted } => {
                format!("Cannot {} while {}", attempted, current)
            }
            BookingError::UpstreamFailure { message, .. } => {
                format!("Payment gateway failure: {}", message)
            }
            BookingError::Forbidden(message) => message.clone(),
            BookingError::Infrastructure(_) => "Unexpected server error".to_string(),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            BookingError::UpstreamFailure { retryable, .. } => *retryable,
            BookingError::Infrastructure(_) => true,
            _ => false,
        }
    }

    /// Returns true for rule violations detected before any mutation.
    pub fn is_business_failure(&self) -> bool {
        matches!(
            self,
            BookingError::InvalidArgument { .. }
                | BookingError::Conflict(_)
                | BookingError::InsufficientCredits { .. }
                | BookingError::InvalidState { .. }
        )
    }
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::Infrastructure(detail) => write!(f, "Infrastructure error: {}", detail),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for BookingError {}

impl From<ValidationError> for BookingError {
    fn from(err: ValidationError) -> Self {
        BookingError::invalid_argument(err.field().to_string(), err.to_string())
    }
}

impl From<DomainError> for BookingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::AlreadyBooked => BookingError::conflict(ConflictReason::AlreadyBooked),
            ErrorCode::SessionFull => BookingError::conflict(ConflictReason::SessionFull),
            ErrorCode::TrainerOverlap => BookingError::conflict(ConflictReason::TrainerOverlap),
            ErrorCode::DuplicateExternalRef => {
                BookingError::conflict(ConflictReason::DuplicateExternalRef)
            }
            ErrorCode::CapacityBelowBookings => {
                BookingError::conflict(ConflictReason::CapacityBelowBookings)
            }
            ErrorCode::PaymentNotPaid => BookingError::conflict(ConflictReason::PaymentNotPaid),
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => {
                let field = err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "input".to_string());
                BookingError::invalid_argument(field, err.message)
            }
            ErrorCode::InvalidStateTransition => BookingError::invalid_state("current state", err.message),
            ErrorCode::Forbidden | ErrorCode::Unauthorized => BookingError::forbidden(err.message),
            ErrorCode::PaymentGatewayError | ErrorCode::InvalidWebhookSignature => {
                BookingError::upstream(err.message, false)
            }
            _ => BookingError::infrastructure(err.to_string()),
        }
    }
}
