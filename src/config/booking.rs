//! Booking rules configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Booking rules
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Age after which a PENDING payment may be expired.
    ///
    /// Defaults to the gateway's maximum checkout lifetime.
    #[serde(default = "default_pending_payment_ttl")]
    pub pending_payment_ttl_hours: i64,
}

impl BookingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pending_payment_ttl_hours < 1 {
            return Err(ValidationError::InvalidPendingPaymentTtl);
        }
        Ok(())
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            pending_payment_ttl_hours: default_pending_payment_ttl(),
        }
    }
}

fn default_pending_payment_ttl() -> i64 {
    24
}
