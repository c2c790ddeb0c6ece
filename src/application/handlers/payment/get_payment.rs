//! GetPaymentHandler / ListPaymentsHandler - Payment queries.

use std::sync::Arc;

use crate::domain::foundation::{Actor, BookingError, MemberId, PaymentId};
use crate::domain::payment::Payment;
use crate::ports::BookingReader;

#[derive(Debug, Clone)]
pub struct GetPaymentQuery {
    pub actor: Actor,
    pub payment_id: PaymentId,
}

pub struct GetPaymentHandler {
    reader: Arc<dyn BookingReader>,
}

impl GetPaymentHandler {
    pub fn new(reader: Arc<dyn BookingReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: GetPaymentQuery) -> Result<Payment, BookingError> {
        let payment = self
            .reader
            .get_payment(&query.payment_id)
            .await?
            .ok_or_else(|| BookingError::not_found("payment", query.payment_id))?;
        query.actor.ensure_can_act_for(&payment.member_id)?;
        Ok(payment)
    }
}

#[derive(Debug, Clone)]
pub struct ListPaymentsQuery {
    pub actor: Actor,
    /// Restrict to one member. Members always see only their own.
    pub member_id: Option<MemberId>,
}

pub struct ListPaymentsHandler {
    reader: Arc<dyn BookingReader>,
}

impl ListPaymentsHandler {
    pub fn new(reader: Arc<dyn BookingReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: ListPaymentsQuery) -> Result<Vec<Payment>, BookingError> {
        let member_id = match (query.actor.member_id(), query.member_id) {
            (Some(own), None) => Some(own),
            (_, requested) => requested,
        };
        if let Some(member_id) = &member_id {
            query.actor.ensure_can_act_for(member_id)?;
        }
        Ok(self.reader.list_payments(member_id.as_ref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Studio;

    #[tokio::test]
    async fn member_reads_own_payment() {
        let studio = Studio::new().await;
        let payment_id = studio.pending_payment(1).await;
        let payment = GetPaymentHandler::new(studio.reader())
            .handle(GetPaymentQuery {
                actor: studio.member(),
                payment_id,
            })
            .await
            .unwrap();
        assert_eq!(payment.id, payment_id);
    }

    #[tokio::test]
    async fn member_cannot_read_other_payment() {
        let studio = Studio::new().await;
        let payment_id = studio.pending_payment(1).await;
        let err = GetPaymentHandler::new(studio.reader())
            .handle(GetPaymentQuery {
                actor: Actor::member(MemberId::new()),
                payment_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }

    #[tokio::test]
    async fn member_listing_is_scoped_to_self() {
        let studio = Studio::new().await;
        studio.pending_payment(1).await;
        let stranger = MemberId::new();

        let own = ListPaymentsHandler::new(studio.reader())
            .handle(ListPaymentsQuery {
                actor: Actor::member(stranger),
                member_id: None,
            })
            .await
            .unwrap();
        assert!(own.is_empty());

        let all = ListPaymentsHandler::new(studio.reader())
            .handle(ListPaymentsQuery {
                actor: studio.staff(),
                member_id: None,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }
}
