//! Credit ledger operations.
//!
//! Every balance change goes through here and runs inside the caller's
//! transaction, so a consume followed by a failed dependent step rolls back
//! with it. The balance row is locked (get-or-create) before it is read.

use crate::domain::credits::MemberCredit;
use crate::domain::foundation::{BookingError, MemberId, ServiceId};
use crate::ports::CreditStore;

/// Stateless ledger over a transactional `CreditStore`.
pub struct CreditLedger;

impl CreditLedger {
    /// Get-or-create the balance row and hold its lock.
    pub async fn get_or_create<S>(
        store: &mut S,
        member_id: &MemberId,
        service_id: &ServiceId,
    ) -> Result<MemberCredit, BookingError>
    where
        S: CreditStore + ?Sized,
    {
        Ok(store.lock_credit(member_id, service_id).await?)
    }

    /// Increment the balance.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if amount is not positive
    pub async fn add<S>(
        store: &mut S,
        member_id: &MemberId,
        service_id: &ServiceId,
        amount: i32,
    ) -> Result<MemberCredit, BookingError>
    where
        S: CreditStore + ?Sized,
    {
        let mut credit = store.lock_credit(member_id, service_id).await?;
        credit.add(amount)?;
        store.save_credit(&credit).await?;

        tracing::info!(
            member_id = %member_id,
            service_id = %service_id,
            amount,
            balance = credit.available_credits,
            "Credits added"
        );
        Ok(credit)
    }

    /// Decrement the balance.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if amount is not positive
    /// - `InsufficientCredits` if the balance is lower than amount
    pub async fn consume<S>(
        store: &mut S,
        member_id: &MemberId,
        service_id: &ServiceId,
        amount: i32,
    ) -> Result<MemberCredit, BookingError>
    where
        S: CreditStore + ?Sized,
    {
        let mut credit = store.lock_credit(member_id, service_id).await?;
        credit.consume(amount)?;
        store.save_credit(&credit).await?;

        tracing::debug!(
            member_id = %member_id,
            service_id = %service_id,
            amount,
            balance = credit.available_credits,
            "Credits consumed"
        );
        Ok(credit)
    }
}
