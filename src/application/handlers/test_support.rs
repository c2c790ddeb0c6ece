//! Shared fixture for handler tests: one location with a service, a trainer,
//! and a member, over in-memory adapters and the mock gateway.

use std::sync::Arc;

use crate::adapters::memory::{InMemoryBookingStore, InMemoryDirectory};
use crate::adapters::stripe::MockPaymentGateway;
use crate::domain::foundation::{
    Actor, EmployeeId, LocationId, MemberId, PaymentId, ServiceId, SessionId, Timestamp,
};
use crate::domain::payment::Payment;
use crate::domain::scheduling::{Session, TimeWindow};
use crate::application::ledger::CreditLedger;
use crate::ports::{
    BookingReader, BookingTransaction, BookingUnitOfWork, Directory, PaymentGateway,
    PaymentStore, ServiceRecord, TrainerRecord,
};

pub(crate) struct Studio {
    pub store: InMemoryBookingStore,
    pub directory: InMemoryDirectory,
    pub gateway: MockPaymentGateway,
    pub location_id: LocationId,
    pub service: ServiceRecord,
    pub trainer: TrainerRecord,
    pub member_id: MemberId,
}

impl Studio {
    pub async fn new() -> Self {
        let directory = InMemoryDirectory::new();
        let location = directory.add_location("Downtown").await;
        let service = directory.add_service("Yoga", 1500, location.id).await;
        let trainer = directory.add_trainer("Ana", location.id).await;
        let member = directory.add_member("Mia").await;
        Self {
            store: InMemoryBookingStore::new(),
            directory,
            gateway: MockPaymentGateway::new(),
            location_id: location.id,
            service,
            trainer,
            member_id: member.id,
        }
    }

    pub fn uow(&self) -> Arc<dyn BookingUnitOfWork> {
        Arc::new(self.store.clone())
    }

    pub fn reader(&self) -> Arc<dyn BookingReader> {
        Arc::new(self.store.clone())
    }

    pub fn directory(&self) -> Arc<dyn Directory> {
        Arc::new(self.directory.clone())
    }

    pub fn gateway(&self) -> Arc<dyn PaymentGateway> {
        Arc::new(self.gateway.clone())
    }

    pub fn member(&self) -> Actor {
        Actor::member(self.member_id)
    }

    pub fn staff(&self) -> Actor {
        Actor::employee(EmployeeId::new())
    }

    pub fn admin(&self) -> Actor {
        Actor::admin(EmployeeId::new())
    }

    pub fn service_id(&self) -> ServiceId {
        self.service.id
    }

    /// Window starting `hours_from_now` hours ahead, one hour long.
    pub fn window(&self, hours_from_now: i64) -> TimeWindow {
        let start = Timestamp::now().plus_minutes(hours_from_now * 60);
        TimeWindow::new(start, start.plus_minutes(60)).unwrap()
    }

    /// Seed a scheduled session directly.
    pub async fn session(&self, capacity: i32) -> SessionId {
        let session = Session::schedule(
            SessionId::new(),
            self.location_id,
            self.service.id,
            self.trainer.id,
            self.window(24),
            capacity,
        )
        .unwrap();
        let id = session.id;
        self.store.seed_session(session).await;
        id
    }

    /// Grant credits to `member_id` for the studio service.
    pub async fn grant(&self, member_id: MemberId, amount: i32) {
        let mut tx = self.store.begin().await.unwrap();
        CreditLedger::add(tx.as_mut(), &member_id, &self.service.id, amount)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    pub async fn balance(&self, member_id: MemberId) -> i32 {
        self.store
            .balance(&member_id, &self.service.id)
            .await
            .unwrap_or(0)
    }

    /// Seed a pending payment for the studio member and service.
    pub async fn pending_payment(&self, quantity: i32) -> PaymentId {
        self.insert_payment(quantity, None, false).await
    }

    /// Seed a settled payment for the studio member and service.
    pub async fn paid_payment(&self, quantity: i32) -> PaymentId {
        self.insert_payment(quantity, None, true).await
    }

    /// Seed a pending payment that already carries a gateway reference.
    pub async fn pending_payment_with_ref(&self, quantity: i32, reference: &str) -> PaymentId {
        self.insert_payment(quantity, Some(reference), false).await
    }

    async fn insert_payment(
        &self,
        quantity: i32,
        reference: Option<&str>,
        paid: bool,
    ) -> PaymentId {
        let mut payment = Payment::create_pending(
            PaymentId::new(),
            self.member_id,
            self.service.id,
            quantity,
            self.service.price_cents * quantity as i64,
            "EUR",
        )
        .unwrap();
        if let Some(reference) = reference {
            payment.attach_external_ref(reference);
        }
        if paid {
            payment.mark_paid();
        }
        let id = payment.id;
        let mut tx = self.store.begin().await.unwrap();
        tx.insert_payment(&payment).await.unwrap();
        tx.commit().await.unwrap();
        id
    }
}
