//! MemberCredit - per (member, service) spendable balance.
//!
//! Balances change only through `add` and `consume`, both of which run while
//! the owning transaction holds the row lock.

use crate::domain::foundation::{BookingError, MemberCreditId, MemberId, ServiceId, Timestamp};
use serde::{Deserialize, Serialize};

/// Credit balance for one member and one service.
///
/// # Invariants
///
/// - `(member_id, service_id)` is unique
/// - `available_credits >= 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCredit {
    pub id: MemberCreditId,
    pub member_id: MemberId,
    pub service_id: ServiceId,
    pub available_credits: i32,
    pub updated_at: Timestamp,
}

impl MemberCredit {
    /// Fresh zero balance, as created by get-or-create.
    pub fn empty(member_id: MemberId, service_id: ServiceId) -> Self {
        Self {
            id: MemberCreditId::new(),
            member_id,
            service_id,
            available_credits: 0,
            updated_at: Timestamp::now(),
        }
    }

    /// Increment the balance.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if amount is not positive or the balance would overflow
    pub fn add(&mut self, amount: i32) -> Result<(), BookingError> {
        ensure_positive(amount)?;
        self.available_credits = self
            .available_credits
            .checked_add(amount)
            .ok_or_else(|| BookingError::invalid_argument("amount", "credit balance overflow"))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Decrement the balance.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if amount is not positive
    /// - `InsufficientCredits` if the balance is lower than amount
    pub fn consume(&mut self, amount: i32) -> Result<(), BookingError> {
        ensure_positive(amount)?;
        if self.available_credits < amount {
            return Err(BookingError::insufficient_credits(
                self.available_credits,
                amount,
            ));
        }
        self.available_credits -= amount;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

fn ensure_positive(amount: i32) -> Result<(), BookingError> {
    if amount <= 0 {
        return Err(BookingError::invalid_argument(
            "amount",
            "amount must be greater than 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn empty_credit() -> MemberCredit {
        MemberCredit::empty(MemberId::new(), ServiceId::new())
    }

    #[test]
    fn empty_starts_at_zero() {
        assert_eq!(empty_credit().available_credits, 0);
    }

    #[test]
    fn add_increments_balance() {
        let mut credit = empty_credit();
        credit.add(3).unwrap();
        credit.add(2).unwrap();
        assert_eq!(credit.available_credits, 5);
    }

    #[test]
    fn add_rejects_non_positive_amount() {
        let mut credit = empty_credit();
        assert!(matches!(
            credit.add(0),
            Err(BookingError::InvalidArgument { .. })
        ));
        assert!(credit.add(-1).is_err());
        assert_eq!(credit.available_credits, 0);
    }

    #[test]
    fn consume_decrements_balance() {
        let mut credit = empty_credit();
        credit.add(2).unwrap();
        credit.consume(1).unwrap();
        assert_eq!(credit.available_credits, 1);
    }

    #[test]
    fn consume_more_than_balance_fails_without_change() {
        let mut credit = empty_credit();
        credit.add(1).unwrap();

        let err = credit.consume(2).unwrap_err();
        assert_eq!(err, BookingError::insufficient_credits(1, 2));
        assert_eq!(credit.available_credits, 1);
    }

    #[test]
    fn consume_from_zero_reports_insufficient_credits() {
        let mut credit = empty_credit();
        assert!(matches!(
            credit.consume(1),
            Err(BookingError::InsufficientCredits { available: 0, .. })
        ));
    }

    #[test]
    fn add_overflow_is_rejected() {
        let mut credit = empty_credit();
        credit.available_credits = i32::MAX;
        assert!(credit.add(1).is_err());
        assert_eq!(credit.available_credits, i32::MAX);
    }

    proptest! {
        #[test]
        fn balance_never_goes_negative(ops in prop::collection::vec((any::<bool>(), -3i32..10), 0..64)) {
            let mut credit = empty_credit();
            let mut expected: i64 = 0;

            for (is_add, amount) in ops {
                let result = if is_add { credit.add(amount) } else { credit.consume(amount) };
                if result.is_ok() {
                    expected += if is_add { amount as i64 } else { -(amount as i64) };
                }
                prop_assert!(credit.available_credits >= 0);
                prop_assert_eq!(credit.available_credits as i64, expected);
            }
        }
    }
}
