//! Webhook error types for billing webhook handling.
//!
//! Defines all error conditions that can occur while verifying and applying
//! provider webhooks, with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between delivery and acknowledgement.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// No signature candidate matched the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Delivery timestamp is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Delivery timestamp sits further ahead than clock skew allows.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// The signature header itself could not be parsed, so the payload
    /// could not be authenticated.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    /// The payload authenticated but could not be parsed. Acknowledged so
    /// the provider stops redelivering a body we will never understand.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Event deliberately skipped; an outcome, not a fault.
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Datastore operation failed while applying the event.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    ///
    /// Only transient datastore failures warrant redelivery; every other
    /// outcome is final for the delivery attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_))
    }

    /// HTTP status the webhook endpoint should answer with.
    ///
    /// Status codes determine the provider's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Rejected, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Could not authenticate the request - reject without retry
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::MalformedHeader(_) => StatusCode::BAD_REQUEST,

            // Authentic but unusable or irrelevant - acknowledge as success
            WebhookError::MalformedPayload(_) | WebhookError::Ignored(_) => StatusCode::OK,

            // Server errors - provider will redeliver
            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
