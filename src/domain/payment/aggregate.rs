//! Payment aggregate entity.
//!
//! A payment records one credit purchase. It is the single source of truth for
//! whether a purchase has been fulfilled: credits are issued when it is paid,
//! and `credits_applied` guarantees that happens exactly once.

use crate::domain::foundation::{
    BookingError, MemberId, PaymentId, ServiceId, StateMachine, Timestamp, ValidationError,
};
use serde::{Deserialize, Serialize};

use super::PaymentStatus;

/// Currency used when neither the caller nor configuration names one.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Largest number of credits purchasable in one payment.
pub const MAX_QUANTITY: i32 = 1000;

/// Changes a staff member may apply to an existing payment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentTerms {
    pub quantity: Option<i32>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
}

/// How the purchase is presented on the gateway checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutLine {
    pub unit_amount_cents: i64,
    pub quantity: i32,
}

/// Payment aggregate.
///
/// # Invariants
///
/// - `quantity >= 1`, `amount_cents > 0`
/// - `currency` is a three-letter upper-case code
/// - `credits_applied` implies `status == Paid`
/// - `paid_at` is set iff status is `Paid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub member_id: MemberId,
    pub service_id: ServiceId,
    pub quantity: i32,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub external_ref: Option<String>,
    pub credits_applied: bool,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Create a pending payment awaiting checkout.
    pub fn create_pending(
        id: PaymentId,
        member_id: MemberId,
        service_id: ServiceId,
        quantity: i32,
        amount_cents: i64,
        currency: &str,
    ) -> Result<Self, ValidationError> {
        validate_quantity(quantity)?;
        validate_amount(amount_cents)?;
        let currency = normalize_currency(currency)?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            member_id,
            service_id,
            quantity,
            amount_cents,
            currency,
            status: PaymentStatus::Pending,
            external_ref: None,
            credits_applied: false,
            created_at: now,
            paid_at: None,
            updated_at: now,
        })
    }

    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }

    /// Record the gateway reference for this payment.
    pub fn attach_external_ref(&mut self, external_ref: impl Into<String>) {
        self.external_ref = Some(external_ref.into());
        self.updated_at = Timestamp::now();
    }

    /// Move to `Paid`.
    ///
    /// Returns `false` when already paid, leaving `paid_at` untouched.
    pub fn mark_paid(&mut self) -> bool {
        match self.status.transition_to(PaymentStatus::Paid) {
            Ok(next) => {
                let now = Timestamp::now();
                self.status = next;
                self.paid_at = Some(now);
                self.updated_at = now;
                true
            }
            Err(_) => false,
        }
    }

    /// Claim the credits owed by this payment.
    ///
    /// Returns the quantity to add to the ledger exactly once per paid
    /// payment, and `None` on every later call or while not paid.
    pub fn take_credits_to_apply(&mut self) -> Option<i32> {
        if !self.is_paid() || self.credits_applied {
            return None;
        }
        self.credits_applied = true;
        self.updated_at = Timestamp::now();
        Some(self.quantity)
    }

    /// Move a pending payment to `Expired`.
    pub fn expire(&mut self) -> bool {
        if self.status != PaymentStatus::Pending {
            return false;
        }
        match self.status.transition_to(PaymentStatus::Expired) {
            Ok(next) => {
                self.status = next;
                self.updated_at = Timestamp::now();
                true
            }
            Err(_) => false,
        }
    }

    /// True if pending and created before `cutoff`.
    pub fn is_stale(&self, cutoff: &Timestamp) -> bool {
        self.status == PaymentStatus::Pending && self.created_at.is_before(cutoff)
    }

    /// Apply staff edits to quantity, amount, or currency.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if a new value fails validation
    /// - `InvalidState` if the payment is paid and a financial field changes
    pub fn update_terms(&mut self, terms: PaymentTerms) -> Result<(), BookingError> {
        let quantity = terms.quantity.unwrap_or(self.quantity);
        let amount_cents = terms.amount_cents.unwrap_or(self.amount_cents);
        let currency = match terms.currency {
            Some(c) => normalize_currency(&c)?,
            None => self.currency.clone(),
        };
        validate_quantity(quantity)?;
        validate_amount(amount_cents)?;

        let changes_terms = quantity != self.quantity
            || amount_cents != self.amount_cents
            || currency != self.currency;
        if !changes_terms {
            return Ok(());
        }
        if self.is_paid() {
            return Err(BookingError::invalid_state(
                self.status.as_str(),
                "change the financial terms of a payment",
            ));
        }

        self.quantity = quantity;
        self.amount_cents = amount_cents;
        self.currency = currency;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Line item sent to the checkout page.
    ///
    /// Shows `quantity x unit price` when the total divides evenly, otherwise
    /// a single line carrying the whole amount.
    pub fn checkout_line(&self) -> CheckoutLine {
        let quantity = self.quantity as i64;
        if quantity > 0 && self.amount_cents % quantity == 0 {
            CheckoutLine {
                unit_amount_cents: self.amount_cents / quantity,
                quantity: self.quantity,
            }
        } else {
            CheckoutLine {
                unit_amount_cents: self.amount_cents,
                quantity: 1,
            }
        }
    }
}

fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(ValidationError::out_of_range(
            "quantity",
            1,
            MAX_QUANTITY as i64,
            quantity as i64,
        ));
    }
    Ok(())
}

fn validate_amount(amount_cents: i64) -> Result<(), ValidationError> {
    if amount_cents <= 0 {
        return Err(ValidationError::out_of_range(
            "amount",
            1,
            i64::MAX,
            amount_cents,
        ));
    }
    Ok(())
}

/// Trims and upper-cases a currency code; blank falls back to EUR.
pub fn normalize_currency(currency: &str) -> Result<String, ValidationError> {
    let trimmed = currency.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_CURRENCY.to_string());
    }
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::invalid_format(
            "currency",
            "expected a three-letter ISO code",
        ));
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(quantity: i32, amount_cents: i64) -> Payment {
        Payment::create_pending(
            PaymentId::new(),
            MemberId::new(),
            ServiceId::new(),
            quantity,
            amount_cents,
            "eur",
        )
        .unwrap()
    }

    // Construction

    #[test]
    fn create_pending_normalizes_currency() {
        let payment = pending(1, 1500);
        assert_eq!(payment.currency, "EUR");
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(!payment.credits_applied);
        assert!(payment.external_ref.is_none());
    }

    #[test]
    fn create_pending_rejects_zero_quantity() {
        let result = Payment::create_pending(
            PaymentId::new(),
            MemberId::new(),
            ServiceId::new(),
            0,
            1500,
            "EUR",
        );
        assert_eq!(result.unwrap_err().field(), "quantity");
    }

    #[test]
    fn create_pending_rejects_non_positive_amount() {
        let result = Payment::create_pending(
            PaymentId::new(),
            MemberId::new(),
            ServiceId::new(),
            1,
            0,
            "EUR",
        );
        assert_eq!(result.unwrap_err().field(), "amount");
    }

    #[test]
    fn blank_currency_defaults_to_eur() {
        assert_eq!(normalize_currency("  ").unwrap(), "EUR");
        assert_eq!(normalize_currency(" usd ").unwrap(), "USD");
        assert!(normalize_currency("euro").is_err());
    }

    // Lifecycle

    #[test]
    fn mark_paid_is_idempotent() {
        let mut payment = pending(1, 1500);
        assert!(payment.mark_paid());
        let paid_at = payment.paid_at;
        assert!(!payment.mark_paid());
        assert_eq!(payment.paid_at, paid_at);
    }

    #[test]
    fn credits_are_claimed_once() {
        let mut payment = pending(3, 4500);
        assert_eq!(payment.take_credits_to_apply(), None);

        payment.mark_paid();
        assert_eq!(payment.take_credits_to_apply(), Some(3));
        assert_eq!(payment.take_credits_to_apply(), None);
        assert!(payment.credits_applied);
    }

    #[test]
    fn expire_only_affects_pending() {
        let mut payment = pending(1, 1500);
        assert!(payment.expire());
        assert_eq!(payment.status, PaymentStatus::Expired);
        assert!(!payment.expire());

        let mut paid = pending(1, 1500);
        paid.mark_paid();
        assert!(!paid.expire());
    }

    #[test]
    fn expired_payment_can_still_be_paid() {
        let mut payment = pending(2, 3000);
        payment.expire();
        assert!(payment.mark_paid());
        assert_eq!(payment.take_credits_to_apply(), Some(2));
    }

    #[test]
    fn stale_means_pending_and_old() {
        let payment = pending(1, 1500);
        let future = Timestamp::now().plus_minutes(5);
        let past = Timestamp::now().minus_hours(1);
        assert!(payment.is_stale(&future));
        assert!(!payment.is_stale(&past));
    }

    // Staff edits

    #[test]
    fn update_terms_on_pending_payment() {
        let mut payment = pending(1, 1500);
        payment
            .update_terms(PaymentTerms {
                quantity: Some(2),
                amount_cents: Some(2800),
                currency: Some("usd".to_string()),
            })
            .unwrap();
        assert_eq!(payment.quantity, 2);
        assert_eq!(payment.amount_cents, 2800);
        assert_eq!(payment.currency, "USD");
    }

    #[test]
    fn update_terms_rejects_financial_change_on_paid() {
        let mut payment = pending(1, 1500);
        payment.mark_paid();
        let err = payment
            .update_terms(PaymentTerms {
                quantity: Some(5),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { .. }));
        assert_eq!(payment.quantity, 1);
    }

    #[test]
    fn update_terms_with_same_values_on_paid_is_allowed() {
        let mut payment = pending(1, 1500);
        payment.mark_paid();
        assert!(payment
            .update_terms(PaymentTerms {
                quantity: Some(1),
                amount_cents: Some(1500),
                currency: Some("eur".to_string()),
            })
            .is_ok());
    }

    #[test]
    fn update_terms_validates_values() {
        let mut payment = pending(1, 1500);
        assert!(payment
            .update_terms(PaymentTerms {
                amount_cents: Some(-5),
                ..Default::default()
            })
            .is_err());
    }

    // Checkout presentation

    #[test]
    fn checkout_line_splits_even_totals() {
        let payment = pending(3, 4500);
        assert_eq!(
            payment.checkout_line(),
            CheckoutLine {
                unit_amount_cents: 1500,
                quantity: 3
            }
        );
    }

    #[test]
    fn checkout_line_falls_back_to_single_line() {
        let payment = pending(3, 1000);
        assert_eq!(
            payment.checkout_line(),
            CheckoutLine {
                unit_amount_cents: 1000,
                quantity: 1
            }
        );
    }
}
