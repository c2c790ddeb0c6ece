//! ConfirmPaymentHandler - Command handler for the checkout return poll.
//!
//! After checkout the member is redirected back with the gateway reference.
//! The gateway is asked for the payment status before anything is locked; a
//! paid status settles the payment exactly like a webhook would.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{Actor, BookingError};
use crate::domain::payment::Payment;
use crate::ports::{
    BookingReader, BookingTransaction, BookingUnitOfWork, PaymentGateway, PaymentStore,
};

use super::settlement::{call_gateway, settle, Settlement};

#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    pub actor: Actor,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct ConfirmPaymentResult {
    pub payment: Payment,
    /// `None` when the gateway does not report the payment as paid.
    pub settlement: Option<Settlement>,
}

pub struct ConfirmPaymentHandler {
    uow: Arc<dyn BookingUnitOfWork>,
    reader: Arc<dyn BookingReader>,
    gateway: Arc<dyn PaymentGateway>,
    gateway_timeout: Duration,
}

impl ConfirmPaymentHandler {
    pub fn new(
        uow: Arc<dyn BookingUnitOfWork>,
        reader: Arc<dyn BookingReader>,
        gateway: Arc<dyn PaymentGateway>,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            uow,
            reader,
            gateway,
            gateway_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentResult, BookingError> {
        // 1. Find the payment and authorize
        let payment = self
            .reader
            .find_payment_by_external_ref(&cmd.reference)
            .await?
            .ok_or_else(|| BookingError::not_found("payment", &cmd.reference))?;
        cmd.actor.ensure_can_act_for(&payment.member_id)?;

        // 2. Ask the gateway, no transaction open
        let status = call_gateway(
            self.gateway_timeout,
            self.gateway.retrieve_payment_status(&cmd.reference),
        )
        .await?;
        if !status.is_paid() {
            tracing::debug!(
                payment_id = %payment.id,
                gateway_status = ?status,
                "Checkout not paid yet"
            );
            return Ok(ConfirmPaymentResult {
                payment,
                settlement: None,
            });
        }

        // 3. Settle under the payment lock
        let mut tx = self.uow.begin().await?;
        let mut payment = tx
            .find_payment_by_external_ref_for_update(&cmd.reference)
            .await?
            .ok_or_else(|| BookingError::not_found("payment", &cmd.reference))?;
        let settlement = settle(tx.as_mut(), &mut payment).await?;
        tx.commit().await?;

        if settlement.newly_paid {
            tracing::info!(
                payment_id = %payment.id,
                external_ref = %cmd.reference,
                "Payment confirmed by checkout return"
            );
        }

        Ok(ConfirmPaymentResult {
            payment,
            settlement: Some(settlement),
        })
    }
}
