//! Payment settlement shared by every path that learns a payment was paid.

use std::future::Future;
use std::time::Duration;

use crate::application::ledger::CreditLedger;
use crate::domain::foundation::BookingError;
use crate::domain::payment::Payment;
use crate::ports::{BookingTransaction, GatewayError, PaymentStore};

/// What settling a payment changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// The payment moved to paid in this call.
    pub newly_paid: bool,
    /// Credits issued in this call.
    pub credits_added: Option<i32>,
}

impl Settlement {
    pub fn changed(&self) -> bool {
        self.newly_paid || self.credits_added.is_some()
    }
}

/// Mark a locked payment paid and issue its credits if still owed.
///
/// Runs inside the caller's transaction. A paid payment whose credits were
/// already applied is left untouched, so concurrent notifications and
/// confirmations add credits once.
pub(super) async fn settle(
    tx: &mut dyn BookingTransaction,
    payment: &mut Payment,
) -> Result<Settlement, BookingError> {
    let newly_paid = payment.mark_paid();
    let credits_added = payment.take_credits_to_apply();

    if let Some(quantity) = credits_added {
        CreditLedger::add(&mut *tx, &payment.member_id, &payment.service_id, quantity).await?;
        tracing::info!(
            payment_id = %payment.id,
            member_id = %payment.member_id,
            service_id = %payment.service_id,
            quantity,
            "Payment credits applied"
        );
    }

    let settlement = Settlement {
        newly_paid,
        credits_added,
    };
    if settlement.changed() {
        tx.update_payment(payment).await?;
    }
    Ok(settlement)
}

/// Await a gateway call with a deadline.
///
/// Transport failures and timeouts surface as retryable upstream failures.
pub(super) async fn call_gateway<T, F>(timeout: Duration, call: F) -> Result<T, BookingError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, retryable = err.retryable, "Payment gateway call failed");
            Err(BookingError::upstream(err.to_string(), err.retryable))
        }
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Payment gateway call timed out");
            Err(BookingError::upstream("Payment gateway timed out", true))
        }
    }
}
