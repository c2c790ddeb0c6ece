//! Row types and error mapping shared by the PostgreSQL booking adapters.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::credits::MemberCredit;
use crate::domain::foundation::{
    DomainError, EmployeeId, ErrorCode, LocationId, MemberCreditId, MemberId, PaymentId,
    ReservationId, ServiceId, SessionId, Timestamp,
};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::domain::scheduling::{Session, SessionStatus, TimeWindow};

pub(super) const SESSION_COLUMNS: &str = "id, location_id, service_id, trainer_id, starts_at, ends_at, capacity, status, created_at, updated_at";

pub(super) const RESERVATION_COLUMNS: &str =
    "id, member_id, session_id, payment_id, status, note, credit_consumed, created_at, cancelled_at";

pub(super) const CREDIT_COLUMNS: &str = "id, member_id, service_id, available_credits, updated_at";

pub(super) const PAYMENT_COLUMNS: &str = "id, member_id, service_id, quantity, amount_cents, currency, status, external_ref, credits_applied, created_at, paid_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct SessionRow {
    id: Uuid,
    location_id: Uuid,
    service_id: Uuid,
    trainer_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    capacity: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let window = TimeWindow::new(
            Timestamp::from_datetime(row.starts_at),
            Timestamp::from_datetime(row.ends_at),
        )
        .map_err(|e| corrupt("session window", e))?;

        Ok(Session {
            id: SessionId::from_uuid(row.id),
            location_id: LocationId::from_uuid(row.location_id),
            service_id: ServiceId::from_uuid(row.service_id),
            trainer_id: EmployeeId::from_uuid(row.trainer_id),
            window,
            capacity: row.capacity,
            status: parse_session_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Session row joined with its active reservation count.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct SessionCountRow {
    #[sqlx(flatten)]
    pub session: SessionRow,
    pub active_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ReservationRow {
    id: Uuid,
    member_id: Uuid,
    session_id: Uuid,
    payment_id: Option<Uuid>,
    status: String,
    note: Option<String>,
    credit_consumed: bool,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = DomainError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let status = ReservationStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid reservation status: {}", row.status),
            )
        })?;

        Ok(Reservation {
            id: ReservationId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            session_id: SessionId::from_uuid(row.session_id),
            payment_id: row.payment_id.map(PaymentId::from_uuid),
            status,
            note: row.note,
            credit_consumed: row.credit_consumed,
            created_at: Timestamp::from_datetime(row.created_at),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CreditRow {
    id: Uuid,
    member_id: Uuid,
    service_id: Uuid,
    available_credits: i32,
    updated_at: DateTime<Utc>,
}

impl From<CreditRow> for MemberCredit {
    fn from(row: CreditRow) -> Self {
        MemberCredit {
            id: MemberCreditId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            service_id: ServiceId::from_uuid(row.service_id),
            available_credits: row.available_credits,
            updated_at: Timestamp::from_datetime(row.updated_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PaymentRow {
    id: Uuid,
    member_id: Uuid,
    service_id: Uuid,
    quantity: i32,
    amount_cents: i64,
    currency: String,
    status: String,
    external_ref: Option<String>,
    credits_applied: bool,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid payment status: {}", row.status),
            )
        })?;

        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            member_id: MemberId::from_uuid(row.member_id),
            service_id: ServiceId::from_uuid(row.service_id),
            quantity: row.quantity,
            amount_cents: row.amount_cents,
            currency: row.currency.trim().to_string(),
            status,
            external_ref: row.external_ref,
            credits_applied: row.credits_applied,
            created_at: Timestamp::from_datetime(row.created_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_session_status(s: &str) -> Result<SessionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "scheduled" => Ok(SessionStatus::Scheduled),
        "cancelled" | "canceled" => Ok(SessionStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid session status: {}", s),
        )),
    }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", what, err))
}

/// Map a sqlx error, translating integrity backstops to their conflict codes.
pub(super) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = match db_err.constraint() {
            Some("sessions_trainer_no_overlap") => Some(ErrorCode::TrainerOverlap),
            Some("reservations_active_member_session_key") => Some(ErrorCode::AlreadyBooked),
            Some("payments_external_ref_key") => Some(ErrorCode::DuplicateExternalRef),
            _ => None,
        };
        if let Some(code) = code {
            return DomainError::new(code, format!("{}: {}", context, db_err.message()));
        }
    }
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}
