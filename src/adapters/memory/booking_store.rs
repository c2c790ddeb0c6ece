//! In-Memory Booking Store Adapter
//!
//! Implements the booking store and reader ports over a single mutex-guarded
//! state. A transaction owns the mutex for its lifetime and works on a copy;
//! commit writes the copy back, drop discards it. Transactions are therefore
//! fully serializable. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::credits::MemberCredit;
use crate::domain::foundation::{
    DomainError, EmployeeId, ErrorCode, MemberId, PaymentId, ReservationId, ServiceId, SessionId,
    Timestamp,
};
use crate::domain::payment::Payment;
use crate::domain::reservation::Reservation;
use crate::domain::scheduling::{Session, TimeWindow};
use crate::ports::{
    BookingReader, BookingTransaction, BookingUnitOfWork, CreditStore, PaymentStore,
    ReservationStore, SessionAvailability, SessionFilter, SessionStore,
};

#[derive(Debug, Clone, Default)]
struct BookingState {
    sessions: HashMap<SessionId, Session>,
    reservations: HashMap<ReservationId, Reservation>,
    credits: HashMap<(MemberId, ServiceId), MemberCredit>,
    payments: HashMap<PaymentId, Payment>,
}

impl BookingState {
    fn active_count(&self, session_id: &SessionId) -> i64 {
        self.reservations
            .values()
            .filter(|r| r.session_id == *session_id && r.is_active())
            .count() as i64
    }

    fn trainer_overlaps(
        &self,
        trainer_id: &EmployeeId,
        window: &TimeWindow,
        exclude: Option<&SessionId>,
    ) -> bool {
        self.sessions.values().any(|s| {
            s.trainer_id == *trainer_id
                && s.is_bookable()
                && Some(&s.id) != exclude
                && s.window.overlaps(window)
        })
    }

    fn has_active(&self, member_id: &MemberId, session_id: &SessionId, exclude: Option<&ReservationId>) -> bool {
        self.reservations.values().any(|r| {
            r.member_id == *member_id
                && r.session_id == *session_id
                && r.is_active()
                && Some(&r.id) != exclude
        })
    }

    fn ref_taken(&self, external_ref: &str, exclude: &PaymentId) -> bool {
        self.payments
            .values()
            .any(|p| p.id != *exclude && p.external_ref.as_deref() == Some(external_ref))
    }
}

/// In-memory implementation of the booking ports.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<Mutex<BookingState>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reservation as-is, bypassing booking rules (useful for tests).
    pub async fn seed_reservation(&self, reservation: Reservation) {
        self.state
            .lock()
            .await
            .reservations
            .insert(reservation.id, reservation);
    }

    /// Insert a session as-is (useful for tests).
    pub async fn seed_session(&self, session: Session) {
        self.state.lock().await.sessions.insert(session.id, session);
    }

    /// Number of reservation rows, active or not.
    pub async fn reservation_count(&self) -> usize {
        self.state.lock().await.reservations.len()
    }

    /// Current balance, or `None` if no row exists yet.
    pub async fn balance(&self, member_id: &MemberId, service_id: &ServiceId) -> Option<i32> {
        self.state
            .lock()
            .await
            .credits
            .get(&(*member_id, *service_id))
            .map(|c| c.available_credits)
    }
}

#[async_trait]
impl BookingUnitOfWork for InMemoryBookingStore {
    async fn begin(&self) -> Result<Box<dyn BookingTransaction>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, working }))
    }
}

/// Open in-memory transaction.
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<BookingState>,
    working: BookingState,
}

#[async_trait]
impl SessionStore for InMemoryTransaction {
    async fn find_session_for_update(
        &mut self,
        id: &SessionId,
    ) -> Result<Option<Session>, DomainError> {
        Ok(self.working.sessions.get(id).cloned())
    }

    async fn find_session(&mut self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.working.sessions.get(id).cloned())
    }

    async fn lock_trainer_schedule(&mut self, _trainer_id: &EmployeeId) -> Result<(), DomainError> {
        // The transaction already holds the whole store.
        Ok(())
    }

    async fn exists_trainer_overlap(
        &mut self,
        trainer_id: &EmployeeId,
        window: &TimeWindow,
        exclude: Option<&SessionId>,
    ) -> Result<bool, DomainError> {
        Ok(self.working.trainer_overlaps(trainer_id, window, exclude))
    }

    async fn insert_session(&mut self, session: &Session) -> Result<(), DomainError> {
        if session.is_bookable()
            && self
                .working
                .trainer_overlaps(&session.trainer_id, &session.window, Some(&session.id))
        {
            return Err(DomainError::new(
                ErrorCode::TrainerOverlap,
                "Trainer already has a session in this time range",
            ));
        }
        self.working.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn update_session(&mut self, session: &Session) -> Result<(), DomainError> {
        if !self.working.sessions.contains_key(&session.id) {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id),
            ));
        }
        if session.is_bookable()
            && self
                .working
                .trainer_overlaps(&session.trainer_id, &session.window, Some(&session.id))
        {
            return Err(DomainError::new(
                ErrorCode::TrainerOverlap,
                "Trainer already has a session in this time range",
            ));
        }
        self.working.sessions.insert(session.id, session.clone());
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for InMemoryTransaction {
    async fn find_reservation_for_update(
        &mut self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, DomainError> {
        Ok(self.working.reservations.get(id).cloned())
    }

    async fn has_active_reservation(
        &mut self,
        member_id: &MemberId,
        session_id: &SessionId,
    ) -> Result<bool, DomainError> {
        Ok(self.working.has_active(member_id, session_id, None))
    }

    async fn count_active_reservations(
        &mut self,
        session_id: &SessionId,
    ) -> Result<i64, DomainError> {
        Ok(self.working.active_count(session_id))
    }

    async fn active_reservations_for_session(
        &mut self,
        session_id: &SessionId,
    ) -> Result<Vec<Reservation>, DomainError> {
        let mut active: Vec<Reservation> = self
            .working
            .reservations
            .values()
            .filter(|r| r.session_id == *session_id && r.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|r| r.created_at);
        Ok(active)
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), DomainError> {
        if reservation.is_active()
            && self.working.has_active(
                &reservation.member_id,
                &reservation.session_id,
                Some(&reservation.id),
            )
        {
            return Err(DomainError::new(
                ErrorCode::AlreadyBooked,
                "Member already holds an active reservation for this session",
            ));
        }
        self.working
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), DomainError> {
        if !self.working.reservations.contains_key(&reservation.id) {
            return Err(DomainError::new(
                ErrorCode::ReservationNotFound,
                format!("Reservation not found: {}", reservation.id),
            ));
        }
        self.working
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }
}

#[async_trait]
impl CreditStore for InMemoryTransaction {
    async fn lock_credit(
        &mut self,
        member_id: &MemberId,
        service_id: &ServiceId,
    ) -> Result<MemberCredit, DomainError> {
        let credit = self
            .working
            .credits
            .entry((*member_id, *service_id))
            .or_insert_with(|| MemberCredit::empty(*member_id, *service_id));
        Ok(credit.clone())
    }

    async fn save_credit(&mut self, credit: &MemberCredit) -> Result<(), DomainError> {
        if credit.available_credits < 0 {
            return Err(DomainError::database(
                "available_credits must not be negative",
            ));
        }
        self.working
            .credits
            .insert((credit.member_id, credit.service_id), credit.clone());
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for InMemoryTransaction {
    async fn find_payment_for_update(
        &mut self,
        id: &PaymentId,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self.working.payments.get(id).cloned())
    }

    async fn find_payment_by_external_ref_for_update(
        &mut self,
        external_ref: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .working
            .payments
            .values()
            .find(|p| p.external_ref.as_deref() == Some(external_ref))
            .cloned())
    }

    async fn external_ref_taken(
        &mut self,
        external_ref: &str,
        exclude: &PaymentId,
    ) -> Result<bool, DomainError> {
        Ok(self.working.ref_taken(external_ref, exclude))
    }

    async fn stale_payments_for_update(
        &mut self,
        cutoff: &Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        let mut stale: Vec<Payment> = self
            .working
            .payments
            .values()
            .filter(|p| p.is_stale(cutoff))
            .cloned()
            .collect();
        stale.sort_by_key(|p| p.created_at);
        Ok(stale)
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), DomainError> {
        self.put_payment(payment)
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), DomainError> {
        if !self.working.payments.contains_key(&payment.id) {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("Payment not found: {}", payment.id),
            ));
        }
        self.put_payment(payment)
    }
}

impl InMemoryTransaction {
    fn put_payment(&mut self, payment: &Payment) -> Result<(), DomainError> {
        if let Some(external_ref) = payment.external_ref.as_deref() {
            if self.working.ref_taken(external_ref, &payment.id) {
                return Err(DomainError::new(
                    ErrorCode::DuplicateExternalRef,
                    "External reference already exists",
                ));
            }
        }
        self.working.payments.insert(payment.id, payment.clone());
        Ok(())
    }
}

#[async_trait]
impl BookingTransaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let InMemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl BookingReader for InMemoryBookingStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.state.lock().await.sessions.get(id).cloned())
    }

    async fn list_available_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<Vec<SessionAvailability>, DomainError> {
        let state = self.state.lock().await;
        let mut available: Vec<SessionAvailability> = state
            .sessions
            .values()
            .filter(|s| s.is_bookable() && filter.matches(s))
            .map(|s| SessionAvailability {
                session: s.clone(),
                active_count: state.active_count(&s.id),
            })
            .collect();
        available.sort_by_key(|a| a.session.window.starts_at());
        Ok(available)
    }

    async fn get_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, DomainError> {
        Ok(self.state.lock().await.reservations.get(id).cloned())
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, DomainError> {
        let state = self.state.lock().await;
        let mut reservations: Vec<Reservation> = state.reservations.values().cloned().collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn list_reservations_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<Reservation>, DomainError> {
        let state = self.state.lock().await;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| r.member_id == *member_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn list_credits_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<MemberCredit>, DomainError> {
        let state = self.state.lock().await;
        let mut credits: Vec<MemberCredit> = state
            .credits
            .values()
            .filter(|c| c.member_id == *member_id)
            .cloned()
            .collect();
        credits.sort_by_key(|c| c.service_id);
        Ok(credits)
    }

    async fn get_payment(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.state.lock().await.payments.get(id).cloned())
    }

    async fn find_payment_by_external_ref(
        &self,
        external_ref: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .state
            .lock()
            .await
            .payments
            .values()
            .find(|p| p.external_ref.as_deref() == Some(external_ref))
            .cloned())
    }

    async fn list_payments(
        &self,
        member_id: Option<&MemberId>,
    ) -> Result<Vec<Payment>, DomainError> {
        let state = self.state.lock().await;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| member_id.map_or(true, |m| p.member_id == *m))
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::LocationId;

    fn session(trainer_id: EmployeeId, start_secs: i64, end_secs: i64) -> Session {
        let base = 1_705_312_800;
        Session::schedule(
            SessionId::new(),
            LocationId::new(),
            ServiceId::new(),
            trainer_id,
            TimeWindow::new(
                Timestamp::from_unix_secs(base + start_secs),
                Timestamp::from_unix_secs(base + end_secs),
            )
            .unwrap(),
            5,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryBookingStore::new();
        let member = MemberId::new();
        let service = ServiceId::new();
        {
            let mut tx = store.begin().await.unwrap();
            let mut credit = tx.lock_credit(&member, &service).await.unwrap();
            credit.add(5).unwrap();
            tx.save_credit(&credit).await.unwrap();
        }
        assert_eq!(store.balance(&member, &service).await, None);
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = InMemoryBookingStore::new();
        let member = MemberId::new();
        let service = ServiceId::new();

        let mut tx = store.begin().await.unwrap();
        let mut credit = tx.lock_credit(&member, &service).await.unwrap();
        credit.add(2).unwrap();
        tx.save_credit(&credit).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.balance(&member, &service).await, Some(2));
    }

    #[tokio::test]
    async fn lock_credit_creates_single_row() {
        let store = InMemoryBookingStore::new();
        let member = MemberId::new();
        let service = ServiceId::new();

        let mut tx = store.begin().await.unwrap();
        let first = tx.lock_credit(&member, &service).await.unwrap();
        let second = tx.lock_credit(&member, &service).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn overlap_ignores_excluded_and_cancelled_sessions() {
        let store = InMemoryBookingStore::new();
        let trainer = EmployeeId::new();
        let existing = session(trainer, 0, 3600);
        let mut cancelled = session(trainer, 7200, 10800);
        cancelled.cancel();
        store.seed_session(existing.clone()).await;
        store.seed_session(cancelled.clone()).await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx
            .exists_trainer_overlap(&trainer, &existing.window, None)
            .await
            .unwrap());
        assert!(!tx
            .exists_trainer_overlap(&trainer, &existing.window, Some(&existing.id))
            .await
            .unwrap());
        assert!(!tx
            .exists_trainer_overlap(&trainer, &cancelled.window, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn insert_session_rejects_overlap() {
        let store = InMemoryBookingStore::new();
        let trainer = EmployeeId::new();
        store.seed_session(session(trainer, 0, 3600)).await;

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .insert_session(&session(trainer, 1800, 5400))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TrainerOverlap);
    }

    #[tokio::test]
    async fn duplicate_active_reservation_is_rejected() {
        let store = InMemoryBookingStore::new();
        let member = MemberId::new();
        let session_id = SessionId::new();
        let first =
            Reservation::book(ReservationId::new(), member, session_id, None, None).unwrap();
        let second =
            Reservation::book(ReservationId::new(), member, session_id, None, None).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_reservation(&first).await.unwrap();
        let err = tx.insert_reservation(&second).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyBooked);
    }

    #[tokio::test]
    async fn duplicate_external_ref_is_rejected() {
        let store = InMemoryBookingStore::new();
        let mut first = Payment::create_pending(
            PaymentId::new(),
            MemberId::new(),
            ServiceId::new(),
            1,
            1500,
            "EUR",
        )
        .unwrap();
        let mut second = first.clone();
        second.id = PaymentId::new();
        first.attach_external_ref("cs_1");
        second.attach_external_ref("cs_1");

        let mut tx = store.begin().await.unwrap();
        tx.insert_payment(&first).await.unwrap();
        let err = tx.insert_payment(&second).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateExternalRef);
    }
}
