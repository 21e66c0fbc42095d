//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` trait for Stripe API integration.
//! Handles checkout sessions, billing portal sessions, and webhook
//! verification.
//!
//! # Security
//!
//! - Webhook signatures are verified (HMAC-SHA256, constant-time
//!   comparison) before any payload interpretation
//! - Delivery timestamps outside the replay window are refused
//! - The API key and webhook secret stay inside `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret, price_id);
//! let adapter = StripeBillingAdapter::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::entitlement::{StripeEvent, StripeWebhookVerifier, WebhookError};
use crate::ports::{
    BillingError, BillingEvent, BillingEventData, BillingEventKind, BillingProvider,
    CheckoutSession, CheckoutSessionDetails, CreateCheckoutRequest, PortalSession, ProviderStatus,
};

use super::webhook_types::{StripeCheckoutSession, StripeSubscription};

/// Timeout for Stripe API calls. Checkout and portal sessions are created
/// while an end user waits, so a hung call must fail well before the
/// request-level timeout fires.
const STRIPE_API_TIMEOUT: Duration = Duration::from_secs(15);

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key, sk_live_ or sk_test_ prefixed.
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// API base URL, overridable for tests against a local stub.
    api_base_url: String,

    /// Price ID for the monthly subscription.
    price_id: String,

    /// Where Stripe redirects after successful payment. The
    /// `{CHECKOUT_SESSION_ID}` placeholder is filled in by Stripe.
    success_url: String,

    /// Where Stripe redirects when the customer abandons checkout.
    cancel_url: String,

    /// Reject test-mode webhook events when set.
    require_livemode: bool,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        price_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
            price_id: price_id.into(),
            success_url: "https://app.jobsheet.pro/billing/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://app.jobsheet.pro/billing/cancelled".to_string(),
            require_livemode: false,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the redirect URLs for checkout completion and abandonment.
    pub fn with_checkout_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }

    /// Require livemode events in production.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }
}

/// Stripe billing provider adapter.
///
/// Implements `BillingProvider` for Stripe API integration.
pub struct StripeBillingAdapter {
    config: StripeConfig,
    verifier: StripeWebhookVerifier,
    http_client: reqwest::Client,
}

impl StripeBillingAdapter {
    /// Builds the adapter and its HTTP client from `config`.
    pub fn new(config: StripeConfig) -> Self {
        let verifier = StripeWebhookVerifier::new(config.webhook_secret.expose_secret().as_str());
        let http_client = reqwest::Client::builder()
            .timeout(STRIPE_API_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            verifier,
            http_client,
        }
    }

    /// Map a failed API response to a billing error.
    async fn api_error(&self, response: reqwest::Response, operation: &str) -> BillingError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::warn!(
            operation,
            status = %status,
            error = %error_text,
            "Stripe API call failed"
        );

        match status {
            reqwest::StatusCode::UNAUTHORIZED => {
                BillingError::authentication("Stripe rejected the API key")
            }
            reqwest::StatusCode::NOT_FOUND => BillingError::not_found(operation),
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                BillingError::rate_limited("Stripe rate limit exceeded")
            }
            _ => BillingError::provider_error(format!("Stripe API error: {}", error_text)),
        }
    }

    /// Map a verified Stripe event into the provider-agnostic form.
    fn map_event(&self, event: StripeEvent) -> Result<BillingEvent, WebhookError> {
        let kind = match event.event_type.as_str() {
            "checkout.session.completed" => BillingEventKind::CheckoutCompleted,
            "customer.subscription.updated" => BillingEventKind::SubscriptionUpdated,
            "customer.subscription.deleted" => BillingEventKind::SubscriptionDeleted,
            other => BillingEventKind::Unknown(other.to_string()),
        };

        let data = match kind {
            BillingEventKind::CheckoutCompleted => {
                let session: StripeCheckoutSession = event.deserialize_object().map_err(|e| {
                    tracing::warn!(error = %e, event_id = %event.id, "Failed to parse checkout session payload");
                    WebhookError::MalformedPayload(format!("invalid checkout session: {}", e))
                })?;

                BillingEventData::Checkout {
                    account_id: session.account_metadata(),
                    session_id: session.id,
                    customer_ref: session.customer,
                    subscription_ref: session.subscription,
                }
            }

            BillingEventKind::SubscriptionUpdated | BillingEventKind::SubscriptionDeleted => {
                let sub: StripeSubscription = event.deserialize_object().map_err(|e| {
                    tracing::warn!(error = %e, event_id = %event.id, "Failed to parse subscription payload");
                    WebhookError::MalformedPayload(format!("invalid subscription: {}", e))
                })?;

                BillingEventData::Subscription {
                    subscription_ref: sub.id,
                    customer_ref: sub.customer,
                    status: ProviderStatus::from_provider(&sub.status),
                }
            }

            BillingEventKind::Unknown(_) => BillingEventData::Raw {
                json: event.data.object.to_string(),
            },
        };

        Ok(BillingEvent {
            id: event.id,
            kind,
            data,
            created_at: event.created,
        })
    }
}

#[async_trait]
impl BillingProvider for StripeBillingAdapter {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let params = vec![
            ("mode", "subscription".to_string()),
            ("customer_email", request.email),
            ("line_items[0][price]", self.config.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.config.success_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
            ("metadata[account_id]", request.account_id.to_string()),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| BillingError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.api_error(response, "create_checkout_session").await);
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            BillingError::provider_error(format!("Failed to parse Stripe response: {}", e))
        })?;

        // A freshly created session always carries its hosted page URL
        let redirect_url = session.url.ok_or_else(|| {
            BillingError::provider_error("Checkout session response missing URL")
        })?;

        Ok(CheckoutSession {
            id: session.id,
            url: redirect_url,
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSessionDetails, BillingError> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| BillingError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.api_error(response, "checkout session").await);
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            BillingError::provider_error(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(CheckoutSessionDetails {
            account_id: session.account_metadata(),
            id: session.id,
            customer_ref: session.customer,
            subscription_ref: session.subscription,
        })
    }

    async fn create_portal_session(
        &self,
        customer_ref: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        let url = format!("{}/v1/billing_portal/sessions", self.config.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&[("customer", customer_ref), ("return_url", return_url)])
            .send()
            .await
            .map_err(|e| BillingError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.api_error(response, "create_portal_session").await);
        }

        #[derive(Deserialize)]
        struct PortalSessionResponse {
            id: String,
            url: String,
        }

        let portal: PortalSessionResponse = response.json().await.map_err(|e| {
            BillingError::provider_error(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(PortalSession {
            id: portal.id,
            url: portal.url,
        })
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<BillingEvent, WebhookError> {
        // 1. Verify signature and parse the envelope
        let event = self.verifier.verify_and_parse(payload, signature)?;

        // 2. Check livemode if required
        if self.config.require_livemode && event.is_test() {
            tracing::warn!(
                event_id = %event.id,
                "Ignoring test mode event in production"
            );
            return Err(WebhookError::Ignored("test mode event".to_string()));
        }

        // 3. Convert to the provider-agnostic event
        let billing_event = self.map_event(event)?;

        tracing::info!(
            event_id = %billing_event.id,
            kind = ?billing_event.kind,
            "Webhook signature verified"
        );

        Ok(billing_event)
    }
}
