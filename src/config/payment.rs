//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Stripe price ID for the monthly plan
    pub stripe_price_id: String,

    /// Redirect target after a completed checkout
    #[serde(default = "default_success_url")]
    pub checkout_success_url: String,

    /// Redirect target after an abandoned checkout
    #[serde(default = "default_cancel_url")]
    pub checkout_cancel_url: String,

    /// Redirect target when leaving the billing portal
    #[serde(default = "default_portal_return_url")]
    pub portal_return_url: String,

    /// Reject webhook events produced in Stripe test mode
    #[serde(default)]
    pub require_livemode: bool,
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

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if self.stripe_price_id.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_PRICE_ID"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.stripe_price_id.starts_with("price_") {
            return Err(ValidationError::InvalidStripePriceId);
        }

        // A test key cannot produce live events, so the combination is a
        // deployment mistake rather than a working setup
        if self.require_livemode && !self.is_live_mode() {
            return Err(ValidationError::LivemodeRequiresLiveKey);
        }

        for url in [
            &self.checkout_success_url,
            &self.checkout_cancel_url,
            &self.portal_return_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidRedirectUrl);
            }
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_price_id: String::new(),
            checkout_success_url: default_success_url(),
            checkout_cancel_url: default_cancel_url(),
            portal_return_url: default_portal_return_url(),
            require_livemode: false,
        }
    }
}

fn default_success_url() -> String {
    "https://app.jobsheet.pro/billing/success?session_id={CHECKOUT_SESSION_ID}".to_string()
}

fn default_cancel_url() -> String {
    "https://app.jobsheet.pro/billing/cancelled".to_string()
}

fn default_portal_return_url() -> String {
    "https://app.jobsheet.pro/account".to_string()
}
