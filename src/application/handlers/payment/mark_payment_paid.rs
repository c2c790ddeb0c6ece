//! MarkPaymentPaidHandler - Command handler for recording a front-desk payment.

use std::sync::Arc;

use crate::domain::foundation::{Actor, BookingError, PaymentId};
use crate::domain::payment::Payment;
use crate::ports::{BookingTransaction, BookingUnitOfWork, PaymentStore};

use super::settlement::{settle, Settlement};

#[derive(Debug, Clone)]
pub struct MarkPaymentPaidCommand {
    pub actor: Actor,
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone)]
pub struct MarkPaymentPaidResult {
    pub payment: Payment,
    pub settlement: Settlement,
}

/// Marks a payment paid by hand.
///
/// Idempotent. A paid payment whose credits were never applied gets them now.
pub struct MarkPaymentPaidHandler {
    uow: Arc<dyn BookingUnitOfWork>,
}

impl MarkPaymentPaidHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn handle(
        &self,
        cmd: MarkPaymentPaidCommand,
    ) -> Result<MarkPaymentPaidResult, BookingError> {
        cmd.actor.require_admin()?;

        let mut tx = self.uow.begin().await?;
        let mut payment = tx
            .find_payment_for_update(&cmd.payment_id)
            .await?
            .ok_or_else(|| BookingError::not_found("payment", cmd.payment_id))?;

        let settlement = settle(tx.as_mut(), &mut payment).await?;
        tx.commit().await?;

        if settlement.newly_paid {
            tracing::info!(payment_id = %payment.id, "Payment marked paid manually");
        }

        Ok(MarkPaymentPaidResult {
            payment,
            settlement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Studio;
    use crate::domain::payment::PaymentStatus;

    #[tokio::test]
    async fn marks_paid_and_adds_credits_once() {
        let studio = Studio::new().await;
        let payment_id = studio.pending_payment(3).await;
        let handler = MarkPaymentPaidHandler::new(studio.uow());
        let cmd = MarkPaymentPaidCommand {
            actor: studio.admin(),
            payment_id,
        };

        let first = handler.handle(cmd.clone()).await.unwrap();
        assert_eq!(first.payment.status, PaymentStatus::Paid);
        assert!(first.payment.paid_at.is_some());
        assert_eq!(first.settlement.credits_added, Some(3));

        let second = handler.handle(cmd).await.unwrap();
        assert!(!second.settlement.changed());
        assert_eq!(second.payment.paid_at, first.payment.paid_at);
        assert_eq!(studio.balance(studio.member_id).await, 3);
    }

    #[tokio::test]
    async fn paid_payment_missing_credits_is_repaired() {
        let studio = Studio::new().await;
        let payment_id = studio.pending_payment(2).await;
        {
            let mut tx = studio.store.begin().await.unwrap();
            let mut payment = tx.find_payment_for_update(&payment_id).await.unwrap().unwrap();
            payment.mark_paid();
            tx.update_payment(&payment).await.unwrap();
            tx.commit().await.unwrap();
        }

        let result = MarkPaymentPaidHandler::new(studio.uow())
            .handle(MarkPaymentPaidCommand {
                actor: studio.admin(),
                payment_id,
            })
            .await
            .unwrap();

        assert!(!result.settlement.newly_paid);
        assert_eq!(result.settlement.credits_added, Some(2));
        assert_eq!(studio.balance(studio.member_id).await, 2);
    }

    #[tokio::test]
    async fn requires_admin() {
        let studio = Studio::new().await;
        let payment_id = studio.pending_payment(1).await;
        let err = MarkPaymentPaidHandler::new(studio.uow())
            .handle(MarkPaymentPaidCommand {
                actor: studio.staff(),
                payment_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
        assert_eq!(studio.balance(studio.member_id).await, 0);
    }
}
