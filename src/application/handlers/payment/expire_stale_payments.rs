//! ExpireStalePaymentsHandler - Command handler for abandoned checkouts.
//!
//! Pending payments older than the configured lifetime become expired. A
//! later paid report from the gateway still settles them.

use std::sync::Arc;

use crate::domain::foundation::{Actor, BookingError, PaymentId, Timestamp};
use crate::ports::{BookingTransaction, BookingUnitOfWork, PaymentStore};

#[derive(Debug, Clone)]
pub struct ExpireStalePaymentsCommand {
    pub actor: Actor,
}

#[derive(Debug, Clone, Default)]
pub struct ExpireStalePaymentsResult {
    pub expired: Vec<PaymentId>,
}

pub struct ExpireStalePaymentsHandler {
    uow: Arc<dyn BookingUnitOfWork>,
    pending_ttl_hours: i64,
}

impl ExpireStalePaymentsHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>, pending_ttl_hours: i64) -> Self {
        Self {
            uow,
            pending_ttl_hours,
        }
    }

    pub async fn handle(
        &self,
        cmd: ExpireStalePaymentsCommand,
    ) -> Result<ExpireStalePaymentsResult, BookingError> {
        cmd.actor.require_staff()?;
        let cutoff = Timestamp::now().minus_hours(self.pending_ttl_hours);

        let mut tx = self.uow.begin().await?;
        let mut expired = Vec::new();
        for mut payment in tx.stale_payments_for_update(&cutoff).await? {
            if payment.is_stale(&cutoff) && payment.expire() {
                tx.update_payment(&payment).await?;
                expired.push(payment.id);
            }
        }
        tx.commit().await?;

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), cutoff = ?cutoff, "Stale payments expired");
        }
        Ok(ExpireStalePaymentsResult { expired })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::payment::{MarkPaymentPaidCommand, MarkPaymentPaidHandler};
    use crate::application::handlers::test_support::Studio;
    use crate::domain::payment::PaymentStatus;
    use crate::ports::BookingReader;

    #[tokio::test]
    async fn expires_only_old_pending_payments() {
        let studio = Studio::new().await;
        let fresh = studio.pending_payment(1).await;

        // A negative lifetime puts the cutoff in the future.
        let result = ExpireStalePaymentsHandler::new(studio.uow(), -1)
            .handle(ExpireStalePaymentsCommand {
                actor: studio.staff(),
            })
            .await
            .unwrap();
        assert_eq!(result.expired, vec![fresh]);

        let untouched = ExpireStalePaymentsHandler::new(studio.uow(), 24)
            .handle(ExpireStalePaymentsCommand {
                actor: studio.staff(),
            })
            .await
            .unwrap();
        assert!(untouched.expired.is_empty());
    }

    #[tokio::test]
    async fn expired_payment_can_still_be_paid() {
        let studio = Studio::new().await;
        let payment_id = studio.pending_payment(2).await;
        ExpireStalePaymentsHandler::new(studio.uow(), -1)
            .handle(ExpireStalePaymentsCommand {
                actor: studio.staff(),
            })
            .await
            .unwrap();
        let expired = studio.store.get_payment(&payment_id).await.unwrap().unwrap();
        assert_eq!(expired.status, PaymentStatus::Expired);

        MarkPaymentPaidHandler::new(studio.uow())
            .handle(MarkPaymentPaidCommand {
                actor: studio.admin(),
                payment_id,
            })
            .await
            .unwrap();
        assert_eq!(studio.balance(studio.member_id).await, 2);
    }

    #[tokio::test]
    async fn members_cannot_expire() {
        let studio = Studio::new().await;
        let err = ExpireStalePaymentsHandler::new(studio.uow(), 24)
            .handle(ExpireStalePaymentsCommand {
                actor: studio.member(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }
}
