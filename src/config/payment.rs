//! Payment configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Override for the Stripe API base URL (stripe-mock, proxies)
    pub stripe_api_base_url: Option<String>,

    /// Reject webhook events sent in test mode
    #[serde(default)]
    pub require_livemode: bool,

    /// Where the gateway sends the member after paying
    #[serde(default = "default_success_url")]
    pub success_url: String,

    /// Where the gateway sends the member after abandoning checkout
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,

    /// Upper bound for one gateway call, in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,

    /// ISO currency used when a purchase does not name one
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") && !self.stripe_api_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        for url in [&self.success_url, &self.cancel_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidRedirectUrl);
            }
        }
        if self.gateway_timeout_secs == 0 || self.gateway_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.default_currency.len() != 3
            || !self.default_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidationError::InvalidCurrency);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_api_base_url: None,
            require_livemode: false,
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
            gateway_timeout_secs: default_gateway_timeout(),
            default_currency: default_currency(),
        }
    }
}

fn default_success_url() -> String {
    "http://localhost:3000/payments/success?session_id={CHECKOUT_SESSION_ID}".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/payments/cancel".to_string()
}

fn default_gateway_timeout() -> u64 {
    10
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: "sk_test_abcd1234".to_string(),
            stripe_webhook_secret: "whsec_xyz789".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_test_mode() {
        let config = valid();
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());
    }

    #[test]
    fn test_is_live_mode() {
        let config = PaymentConfig {
            stripe_api_key: "sk_live_xxx".to_string(),
            ..valid()
        };
        assert!(config.is_live_mode());
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_defaults() {
        let config = PaymentConfig::default();
        assert_eq!(config.gateway_timeout(), Duration::from_secs(10));
        assert_eq!(config.default_currency, "EUR");
        assert!(config.success_url.contains("{CHECKOUT_SESSION_ID}"));
    }

    #[test]
    fn test_validation_missing_api_key() {
        let config = PaymentConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_missing_webhook_secret() {
        let config = PaymentConfig {
            stripe_webhook_secret: String::new(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = PaymentConfig {
            stripe_api_key: "pk_test_xxx".to_string(), // Publishable key
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStripeKey)
        ));
    }

    #[test]
    fn test_validation_invalid_webhook_secret_prefix() {
        let config = PaymentConfig {
            stripe_webhook_secret: "secret_xxx".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_relative_redirect_url() {
        let config = PaymentConfig {
            success_url: "/payments/success".to_string(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRedirectUrl)
        ));
    }

    #[test]
    fn test_validation_gateway_timeout_bounds() {
        let config = PaymentConfig {
            gateway_timeout_secs: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_currency() {
        let config = PaymentConfig {
            default_currency: "EURO".to_string(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCurrency)
        ));
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid().validate().is_ok());
    }
}
