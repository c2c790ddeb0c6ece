//! CreatePaymentHandler - Command handler for starting a credit purchase.
//!
//! The payment is persisted as pending before the gateway is contacted, and
//! no transaction is held open during the gateway call. If the gateway fails
//! the payment stays pending without a reference.

use std::sync::Arc;

use crate::domain::foundation::{Actor, BookingError, MemberId, PaymentId, ServiceId};
use crate::domain::payment::Payment;
use crate::ports::{
    BookingTransaction, BookingUnitOfWork, CheckoutRequest, Directory, PaymentGateway,
    PaymentStore,
};

use super::settlement::call_gateway;
use super::CheckoutSettings;

#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub actor: Actor,
    pub member_id: MemberId,
    pub service_id: ServiceId,
    /// Credits to buy; defaults to 1.
    pub quantity: Option<i32>,
    /// Total in minor units; defaults to service price times quantity.
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePaymentResult {
    pub payment: Payment,
    pub checkout_url: String,
}

pub struct CreatePaymentHandler {
    uow: Arc<dyn BookingUnitOfWork>,
    directory: Arc<dyn Directory>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl CreatePaymentHandler {
    pub fn new(
        uow: Arc<dyn BookingUnitOfWork>,
        directory: Arc<dyn Directory>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            uow,
            directory,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentCommand,
    ) -> Result<CreatePaymentResult, BookingError> {
        // 1. Authorize and resolve the purchase
        cmd.actor.ensure_can_act_for(&cmd.member_id)?;
        if self.directory.find_member(&cmd.member_id).await?.is_none() {
            return Err(BookingError::not_found("member", cmd.member_id));
        }
        let service = self
            .directory
            .find_service(&cmd.service_id)
            .await?
            .ok_or_else(|| BookingError::not_found("service", cmd.service_id))?;

        let quantity = cmd.quantity.unwrap_or(1);
        let amount_cents = match cmd.amount_cents {
            Some(amount) => amount,
            None => service
                .price_cents
                .checked_mul(quantity.max(0) as i64)
                .ok_or_else(|| BookingError::invalid_argument("amount", "amount overflow"))?,
        };
        let currency = cmd
            .currency
            .unwrap_or_else(|| self.settings.default_currency.clone());

        let mut payment = Payment::create_pending(
            PaymentId::new(),
            cmd.member_id,
            cmd.service_id,
            quantity,
            amount_cents,
            &currency,
        )?;

        // 2. Persist as pending
        let mut tx = self.uow.begin().await?;
        tx.insert_payment(&payment).await?;
        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            member_id = %payment.member_id,
            service_id = %payment.service_id,
            quantity = payment.quantity,
            amount_cents = payment.amount_cents,
            currency = %payment.currency,
            "Payment created"
        );

        // 3. Open the checkout outside any transaction
        let line = payment.checkout_line();
        let request = CheckoutRequest {
            payment_id: payment.id,
            member_id: payment.member_id,
            service_id: payment.service_id,
            product_name: format!("{} credit", service.name),
            unit_amount_cents: line.unit_amount_cents,
            line_quantity: line.quantity,
            credit_quantity: payment.quantity,
            currency: payment.currency.to_ascii_lowercase(),
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
        };
        let checkout = call_gateway(
            self.settings.gateway_timeout,
            self.gateway.create_checkout_session(request),
        )
        .await?;

        // 4. Store the gateway reference
        let mut tx = self.uow.begin().await?;
        let mut stored = tx
            .find_payment_for_update(&payment.id)
            .await?
            .ok_or_else(|| BookingError::not_found("payment", payment.id))?;
        stored.attach_external_ref(checkout.reference.clone());
        tx.update_payment(&stored).await?;
        tx.commit().await?;
        payment = stored;

        tracing::info!(
            payment_id = %payment.id,
            external_ref = %checkout.reference,
            "Checkout session opened"
        );

        Ok(CreatePaymentResult {
            payment,
            checkout_url: checkout.url,
        })
    }
}
