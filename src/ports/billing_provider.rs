//! Billing provider port for the external subscription billing service.
//!
//! Defines the contract for billing integrations (e.g., Stripe).
//! Implementations handle checkout and portal session creation, checkout
//! session retrieval for the verification path, and webhook verification.
//!
//! # Design
//!
//! - **Provider agnostic**: the reconciler and orchestrators only see
//!   these types, never provider wire formats.
//! - **No local state**: every operation here delegates to the remote
//!   service; entitlement records are written elsewhere.
//! - **Verified before parsed**: `verify_webhook` authenticates the raw
//!   payload before any interpretation happens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entitlement::WebhookError;
use crate::domain::foundation::AccountId;

/// Port for billing provider integrations.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a checkout session for a new paid subscription.
    ///
    /// The account id is embedded as correlation metadata on the session;
    /// it is the only link the reconciler has back to an account when the
    /// provider later emits a completion event.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, BillingError>;

    /// Fetch a checkout session by id.
    ///
    /// Used by the verification endpoint to extract the customer and
    /// subscription refs before the completion webhook has arrived.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSessionDetails, BillingError>;

    /// Create a self-service billing portal session.
    async fn create_portal_session(
        &self,
        customer_ref: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError>;

    /// Authenticates a raw delivery and translates it into a `BillingEvent`.
    ///
    /// Returns the typed event if authentic; `WebhookError` preserves the
    /// acknowledge-versus-reject distinction for the HTTP layer.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<BillingEvent, WebhookError>;
}

/// Request to create a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Internal account id (stored as session metadata).
    pub account_id: AccountId,

    /// Account email for checkout pre-fill.
    pub email: String,
}

/// Checkout session for payment completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session id.
    pub id: String,

    /// URL the customer is redirected to for payment.
    pub url: String,
}

/// Checkout session details fetched after the redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionDetails {
    /// Provider's session id.
    pub id: String,

    /// Provider customer ref, if the session established one.
    pub customer_ref: Option<String>,

    /// Provider subscription ref; absent until payment completes.
    pub subscription_ref: Option<String>,

    /// Correlation metadata naming the originating account, if present.
    pub account_id: Option<String>,
}

/// Portal session for subscription self-management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSession {
    /// Provider's session id.
    pub id: String,

    /// URL for the customer to access the portal.
    pub url: String,
}

/// Webhook event from the billing provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingEvent {
    /// Event id from the provider.
    pub id: String,

    /// Event kind.
    pub kind: BillingEventKind,

    /// Event payload.
    pub data: BillingEventData,

    /// Provider-side creation time, Unix seconds.
    pub created_at: i64,
}

/// Kinds of billing events the reconciler routes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingEventKind {
    /// Checkout session completed successfully.
    CheckoutCompleted,

    /// Subscription updated (status change, plan change, etc.).
    SubscriptionUpdated,

    /// Subscription deleted; the paid relationship has ended.
    SubscriptionDeleted,

    /// Unrecognized event kind (acknowledged, never processed).
    Unknown(String),
}

/// Billing event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BillingEventData {
    /// Checkout session data.
    #[serde(rename = "checkout")]
    Checkout {
        session_id: String,
        customer_ref: Option<String>,
        subscription_ref: Option<String>,
        /// Correlation metadata naming the originating account.
        account_id: Option<String>,
    },

    /// Subscription lifecycle data.
    #[serde(rename = "subscription")]
    Subscription {
        subscription_ref: String,
        customer_ref: Option<String>,
        status: ProviderStatus,
    },

    /// Raw data for unrecognized events.
    #[serde(rename = "raw")]
    Raw { json: String },
}

/// Subscription status as reported by the billing provider.
///
/// Closed enum; the reconciler matches exhaustively when mapping to the
/// local record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Subscription is active and current.
    Active,

    /// Payment is past due.
    PastDue,

    /// Subscription is canceled.
    Canceled,

    /// Payment failed after retries exhausted.
    Unpaid,

    /// Initial payment incomplete.
    Incomplete,

    /// Initial payment window lapsed.
    IncompleteExpired,

    /// Subscription is in a provider-side trial.
    Trialing,

    /// Subscription is paused.
    Paused,

    /// Status string the provider added after this enum was written.
    Unknown,
}

impl ProviderStatus {
    /// Parse a provider status string.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "active" => ProviderStatus::Active,
            "past_due" => ProviderStatus::PastDue,
            "canceled" => ProviderStatus::Canceled,
            "unpaid" => ProviderStatus::Unpaid,
            "incomplete" => ProviderStatus::Incomplete,
            "incomplete_expired" => ProviderStatus::IncompleteExpired,
            "trialing" => ProviderStatus::Trialing,
            "paused" => ProviderStatus::Paused,
            _ => ProviderStatus::Unknown,
        }
    }
}

/// Errors from billing provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingError {
    /// Error code for categorization.
    pub code: BillingErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl BillingError {
    /// Create a new billing error.
    pub fn new(code: BillingErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(
            BillingErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }

    /// Create a rate limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::RateLimited, message)
    }

    /// Create a provider error.
    pub fn provider_error(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::ProviderError, message)
    }

    /// Check if the failed operation can be retried.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BillingError {}

/// Billing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimited,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl BillingErrorCode {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingErrorCode::NetworkError | BillingErrorCode::RateLimited
        )
    }
}

impl std::fmt::Display for BillingErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BillingErrorCode::NetworkError => "network_error",
            BillingErrorCode::AuthenticationError => "authentication_error",
            BillingErrorCode::NotFound => "not_found",
            BillingErrorCode::RateLimited => "rate_limited",
            BillingErrorCode::ProviderError => "provider_error",
            BillingErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
