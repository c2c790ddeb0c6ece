//! PostgreSQL implementation of the booking unit of work.
//!
//! Each `begin` opens one database transaction. Row locks come from
//! `SELECT ... FOR UPDATE`; trainer schedules are serialized with a
//! transaction-scoped advisory lock. Dropping the transaction without
//! committing rolls it back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::rows::{
    db_error, CreditRow, PaymentRow, ReservationRow, SessionRow, CREDIT_COLUMNS, PAYMENT_COLUMNS,
    RESERVATION_COLUMNS, SESSION_COLUMNS,
};
use crate::domain::credits::MemberCredit;
use crate::domain::foundation::{
    DomainError, EmployeeId, ErrorCode, MemberCreditId, MemberId, PaymentId, ReservationId,
    ServiceId, SessionId, Timestamp,
};
use crate::domain::payment::Payment;
use crate::domain::reservation::Reservation;
use crate::domain::scheduling::{Session, TimeWindow};
use crate::ports::{
    BookingTransaction, BookingUnitOfWork, CreditStore, PaymentStore, ReservationStore,
    SessionStore,
};

/// Opens booking transactions on a connection pool.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingUnitOfWork for PostgresBookingStore {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// Open booking transaction.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SessionStore for PostgresTransaction {
    async fn find_session_for_update(
        &mut self,
        id: &SessionId,
    ) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sessions WHERE id = $1 FOR UPDATE",
            SESSION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock session", e))?;

        row.map(Session::try_from).transpose()
    }

    async fn find_session(&mut self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to find session", e))?;

        row.map(Session::try_from).transpose()
    }

    async fn lock_trainer_schedule(&mut self, trainer_id: &EmployeeId) -> Result<(), DomainError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("trainer:{}", trainer_id))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to lock trainer schedule", e))?;
        Ok(())
    }

    async fn exists_trainer_overlap(
        &mut self,
        trainer_id: &EmployeeId,
        window: &TimeWindow,
        exclude: Option<&SessionId>,
    ) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM sessions
                WHERE trainer_id = $1
                  AND status = 'scheduled'
                  AND starts_at < $3
                  AND ends_at > $2
                  AND ($4::uuid IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(trainer_id.as_uuid())
        .bind(window.starts_at().as_datetime())
        .bind(window.ends_at().as_datetime())
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to check trainer overlap", e))?;

        Ok(exists)
    }

    async fn insert_session(&mut self, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, location_id, service_id, trainer_id, starts_at, ends_at,
                capacity, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.location_id.as_uuid())
        .bind(session.service_id.as_uuid())
        .bind(session.trainer_id.as_uuid())
        .bind(session.window.starts_at().as_datetime())
        .bind(session.window.ends_at().as_datetime())
        .bind(session.capacity)
        .bind(session.status.as_str())
        .bind(session.created_at.as_datetime())
        .bind(session.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert session", e))?;

        Ok(())
    }

    async fn update_session(&mut self, session: &Session) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                trainer_id = $2,
                starts_at = $3,
                ends_at = $4,
                capacity = $5,
                status = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.trainer_id.as_uuid())
        .bind(session.window.starts_at().as_datetime())
        .bind(session.window.ends_at().as_datetime())
        .bind(session.capacity)
        .bind(session.status.as_str())
        .bind(session.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update session", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for PostgresTransaction {
    async fn find_reservation_for_update(
        &mut self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, DomainError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE id = $1 FOR UPDATE",
            RESERVATION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock reservation", e))?;

        row.map(Reservation::try_from).transpose()
    }

    async fn has_active_reservation(
        &mut self,
        member_id: &MemberId,
        session_id: &SessionId,
    ) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM reservations
                WHERE member_id = $1 AND session_id = $2 AND status = 'confirmed'
            )
            "#,
        )
        .bind(member_id.as_uuid())
        .bind(session_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to check existing reservation", e))?;

        Ok(exists)
    }

    async fn count_active_reservations(
        &mut self,
        session_id: &SessionId,
    ) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE session_id = $1 AND status = 'confirmed'",
        )
        .bind(session_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to count reservations", e))?;

        Ok(count)
    }

    async fn active_reservations_for_session(
        &mut self,
        session_id: &SessionId,
    ) -> Result<Vec<Reservation>, DomainError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM reservations
            WHERE session_id = $1 AND status = 'confirmed'
            ORDER BY created_at ASC
            FOR UPDATE
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(session_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock session reservations", e))?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, member_id, session_id, payment_id, status, note,
                credit_consumed, created_at, cancelled_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.member_id.as_uuid())
        .bind(reservation.session_id.as_uuid())
        .bind(reservation.payment_id.map(|id| *id.as_uuid()))
        .bind(reservation.status.as_str())
        .bind(&reservation.note)
        .bind(reservation.credit_consumed)
        .bind(reservation.created_at.as_datetime())
        .bind(reservation.cancelled_at.map(|t| *t.as_datetime()))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert reservation", e))?;

        Ok(())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET
                status = $2,
                note = $3,
                cancelled_at = $4,
                payment_id = $5
            WHERE id = $1
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.status.as_str())
        .bind(&reservation.note)
        .bind(reservation.cancelled_at.map(|t| *t.as_datetime()))
        .bind(reservation.payment_id.map(|id| *id.as_uuid()))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update reservation", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ReservationNotFound,
                format!("Reservation not found: {}", reservation.id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CreditStore for PostgresTransaction {
    async fn lock_credit(
        &mut self,
        member_id: &MemberId,
        service_id: &ServiceId,
    ) -> Result<MemberCredit, DomainError> {
        // Concurrent creators race on the unique key; the loser inserts
        // nothing and then locks the winner's row.
        sqlx::query(
            r#"
            INSERT INTO member_credits (id, member_id, service_id, available_credits, updated_at)
            VALUES ($1, $2, $3, 0, now())
            ON CONFLICT (member_id, service_id) DO NOTHING
            "#,
        )
        .bind(*MemberCreditId::new().as_uuid())
        .bind(member_id.as_uuid())
        .bind(service_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to create credit balance", e))?;

        let row: CreditRow = sqlx::query_as(&format!(
            "SELECT {} FROM member_credits WHERE member_id = $1 AND service_id = $2 FOR UPDATE",
            CREDIT_COLUMNS
        ))
        .bind(member_id.as_uuid())
        .bind(service_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock credit balance", e))?;

        Ok(row.into())
    }

    async fn save_credit(&mut self, credit: &MemberCredit) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE member_credits SET available_credits = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(credit.id.as_uuid())
        .bind(credit.available_credits)
        .bind(credit.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to save credit balance", e))?;

        Ok(())
    }
}

#[async_trait]
impl PaymentStore for PostgresTransaction {
    async fn find_payment_for_update(
        &mut self,
        id: &PaymentId,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = $1 FOR UPDATE",
            PAYMENT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_payment_by_external_ref_for_update(
        &mut self,
        external_ref: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE external_ref = $1 FOR UPDATE",
            PAYMENT_COLUMNS
        ))
        .bind(external_ref)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn external_ref_taken(
        &mut self,
        external_ref: &str,
        exclude: &PaymentId,
    ) -> Result<bool, DomainError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE external_ref = $1 AND id <> $2)",
        )
        .bind(external_ref)
        .bind(exclude.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to check external reference", e))?;

        Ok(taken)
    }

    async fn stale_payments_for_update(
        &mut self,
        cutoff: &Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM payments
            WHERE status = 'PENDING' AND created_at < $1
            ORDER BY created_at ASC
            FOR UPDATE SKIP LOCKED
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(cutoff.as_datetime())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock stale payments", e))?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, member_id, service_id, quantity, amount_cents, currency, status,
                external_ref, credits_applied, created_at, paid_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.member_id.as_uuid())
        .bind(payment.service_id.as_uuid())
        .bind(payment.quantity)
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.external_ref)
        .bind(payment.credits_applied)
        .bind(payment.created_at.as_datetime())
        .bind(payment.paid_at.map(|t| *t.as_datetime()))
        .bind(payment.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert payment", e))?;

        Ok(())
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                quantity = $2,
                amount_cents = $3,
                currency = $4,
                status = $5,
                external_ref = $6,
                credits_applied = $7,
                paid_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.quantity)
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.external_ref)
        .bind(payment.credits_applied)
        .bind(payment.paid_at.map(|t| *t.as_datetime()))
        .bind(payment.updated_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update payment", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment not found: {}", payment.id),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingTransaction for PostgresTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))
    }
}
