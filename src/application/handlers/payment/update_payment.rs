//! UpdatePaymentHandler - Command handler for staff corrections to a payment.

use std::sync::Arc;

use crate::domain::foundation::{Actor, BookingError, ConflictReason, PaymentId};
use crate::domain::payment::{Payment, PaymentTerms};
use crate::ports::{BookingTransaction, BookingUnitOfWork, PaymentStore};

#[derive(Debug, Clone)]
pub struct UpdatePaymentCommand {
    pub actor: Actor,
    pub payment_id: PaymentId,
    pub quantity: Option<i32>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub external_ref: Option<String>,
}

/// Edits quantity, amount, currency, or gateway reference.
///
/// Financial terms of a paid payment are frozen; the reference stays unique.
pub struct UpdatePaymentHandler {
    uow: Arc<dyn BookingUnitOfWork>,
}

impl UpdatePaymentHandler {
    pub fn new(uow: Arc<dyn BookingUnitOfWork>) -> Self {
        Self { uow }
    }

    pub async fn handle(&self, cmd: UpdatePaymentCommand) -> Result<Payment, BookingError> {
        cmd.actor.require_admin()?;

        let mut tx = self.uow.begin().await?;
        let mut payment = tx
            .find_payment_for_update(&cmd.payment_id)
            .await?
            .ok_or_else(|| BookingError::not_found("payment", cmd.payment_id))?;

        // 1. Financial terms
        payment.update_terms(PaymentTerms {
            quantity: cmd.quantity,
            amount_cents: cmd.amount_cents,
            currency: cmd.currency,
        })?;

        // 2. Gateway reference; blank means unchanged
        let new_ref = cmd
            .external_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        if let Some(new_ref) = new_ref {
            if payment.external_ref.as_deref() != Some(new_ref) {
                if tx.external_ref_taken(new_ref, &payment.id).await? {
                    return Err(BookingError::conflict(ConflictReason::DuplicateExternalRef));
                }
                payment.attach_external_ref(new_ref);
            }
        }

        tx.update_payment(&payment).await?;
        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            quantity = payment.quantity,
            amount_cents = payment.amount_cents,
            currency = %payment.currency,
            "Payment updated"
        );
        Ok(payment)
    }
}
