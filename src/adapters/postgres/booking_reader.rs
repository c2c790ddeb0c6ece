//! PostgreSQL implementation of the BookingReader port.
//!
//! Plain reads outside any transaction; counts may trail concurrent writes.

use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{
    db_error, CreditRow, PaymentRow, ReservationRow, SessionCountRow, SessionRow,
    CREDIT_COLUMNS, PAYMENT_COLUMNS, RESERVATION_COLUMNS, SESSION_COLUMNS,
};
use crate::domain::credits::MemberCredit;
use crate::domain::foundation::{DomainError, MemberId, PaymentId, ReservationId, SessionId};
use crate::domain::payment::Payment;
use crate::domain::reservation::Reservation;
use crate::domain::scheduling::Session;
use crate::ports::{BookingReader, SessionAvailability, SessionFilter};

pub struct PostgresBookingReader {
    pool: PgPool,
}

impl PostgresBookingReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingReader for PostgresBookingReader {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find session", e))?;

        row.map(Session::try_from).transpose()
    }

    async fn list_available_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<Vec<SessionAvailability>, DomainError> {
        let rows: Vec<SessionCountRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.location_id, s.service_id, s.trainer_id, s.starts_at, s.ends_at,
                   s.capacity, s.status, s.created_at, s.updated_at,
                   COUNT(r.id) AS active_count
            FROM sessions s
            LEFT JOIN reservations r
                   ON r.session_id = s.id AND r.status = 'confirmed'
            WHERE s.status = 'scheduled'
              AND ($1::uuid IS NULL OR s.service_id = $1)
              AND ($2::date IS NULL OR (s.starts_at AT TIME ZONE 'UTC')::date = $2)
            GROUP BY s.id
            ORDER BY s.starts_at ASC
            "#,
        )
        .bind(filter.service_id.map(|id| *id.as_uuid()))
        .bind(filter.date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list sessions", e))?;

        rows.into_iter()
            .map(|row| {
                Ok(SessionAvailability {
                    session: Session::try_from(row.session)?,
                    active_count: row.active_count,
                })
            })
            .collect()
    }

    async fn get_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, DomainError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find reservation", e))?;

        row.map(Reservation::try_from).transpose()
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, DomainError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations ORDER BY created_at DESC",
            RESERVATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list reservations", e))?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn list_reservations_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<Reservation>, DomainError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE member_id = $1 ORDER BY created_at DESC",
            RESERVATION_COLUMNS
        ))
        .bind(member_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list reservations", e))?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn list_credits_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<MemberCredit>, DomainError> {
        let rows: Vec<CreditRow> = sqlx::query_as(&format!(
            "SELECT {} FROM member_credits WHERE member_id = $1 ORDER BY service_id",
            CREDIT_COLUMNS
        ))
        .bind(member_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list credits", e))?;

        Ok(rows.into_iter().map(MemberCredit::from).collect())
    }

    async fn get_payment(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_payment_by_external_ref(
        &self,
        external_ref: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE external_ref = $1",
            PAYMENT_COLUMNS
        ))
        .bind(external_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn list_payments(
        &self,
        member_id: Option<&MemberId>,
    ) -> Result<Vec<Payment>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE ($1::uuid IS NULL OR member_id = $1) ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(member_id.map(|id| *id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list payments", e))?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
