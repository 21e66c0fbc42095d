//! Entitlement operation errors.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | AlreadyExists | 409 |
//! | NoBillingRelationship | 400 |
//! | RecordNotFound | 404 |
//! | CheckoutFailed | 502 |
//! | ProviderUnavailable | 503 |
//! | WriteConflict | 409 |
//! | ReconciliationFailed | 500 |

use crate::domain::foundation::AccountId;

/// Errors surfaced by entitlement operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    /// A record already exists for this account. Expected and non-fatal:
    /// the caller falls back to reading the existing record.
    AlreadyExists(AccountId),

    /// No billing customer ref is present, so no portal session can be
    /// opened. Common for trial-only accounts.
    NoBillingRelationship,

    /// No record exists for this account. The evaluator treats the same
    /// condition as `no_record`, not an error; this variant is for
    /// operations that require a record to exist.
    RecordNotFound(AccountId),

    /// The billing provider rejected a checkout session request.
    /// User-interactive; retried by re-click, never automatically.
    CheckoutFailed { message: String },

    /// The billing provider could not be reached or timed out.
    ProviderUnavailable { message: String },

    /// A conditional store write lost a race. Retried internally with a
    /// fresh read before ever reaching a caller.
    WriteConflict,

    /// Conflict retries were exhausted or the datastore failed; the
    /// operation could not be applied.
    ReconciliationFailed { message: String },
}

impl EntitlementError {
    pub fn already_exists(account_id: AccountId) -> Self {
        EntitlementError::AlreadyExists(account_id)
    }

    pub fn no_billing_relationship() -> Self {
        EntitlementError::NoBillingRelationship
    }

    pub fn record_not_found(account_id: AccountId) -> Self {
        EntitlementError::RecordNotFound(account_id)
    }

    pub fn checkout_failed(message: impl Into<String>) -> Self {
        EntitlementError::CheckoutFailed {
            message: message.into(),
        }
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        EntitlementError::ProviderUnavailable {
            message: message.into(),
        }
    }

    pub fn reconciliation_failed(message: impl Into<String>) -> Self {
        EntitlementError::ReconciliationFailed {
            message: message.into(),
        }
    }

    /// Returns the stable error code for the HTTP envelope.
    pub fn code(&self) -> &'static str {
        match self {
            EntitlementError::AlreadyExists(_) => "ALREADY_EXISTS",
            EntitlementError::NoBillingRelationship => "NO_BILLING_RELATIONSHIP",
            EntitlementError::RecordNotFound(_) => "RECORD_NOT_FOUND",
            EntitlementError::CheckoutFailed { .. } => "CHECKOUT_FAILED",
            EntitlementError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            EntitlementError::WriteConflict => "WRITE_CONFLICT",
            EntitlementError::ReconciliationFailed { .. } => "RECONCILIATION_FAILED",
        }
    }

    /// Returns a user-facing message.
    pub fn message(&self) -> String {
        match self {
            EntitlementError::AlreadyExists(account_id) => {
                format!("Account {} already has a subscription record", account_id)
            }
            EntitlementError::NoBillingRelationship => {
                "No billing relationship exists for this account; subscribe first".to_string()
            }
            EntitlementError::RecordNotFound(account_id) => {
                format!("No subscription record for account {}", account_id)
            }
            EntitlementError::CheckoutFailed { message } => {
                format!("Checkout could not be started: {}", message)
            }
            EntitlementError::ProviderUnavailable { message } => {
                format!("Billing provider unavailable: {}", message)
            }
            EntitlementError::WriteConflict => {
                "Subscription record was modified concurrently".to_string()
            }
            EntitlementError::ReconciliationFailed { message } => {
                format!("Could not reconcile subscription state: {}", message)
            }
        }
    }

    /// Returns true if the caller may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EntitlementError::ProviderUnavailable { .. } | EntitlementError::WriteConflict
        )
    }
}

impl std::fmt::Display for EntitlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EntitlementError {}
