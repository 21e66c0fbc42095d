//! HTTP DTOs (Data Transfer Objects) for entitlement and billing endpoints.
//!
//! These types pin down the JSON wire shapes. Domain and application types
//! never cross the HTTP boundary directly; everything converts through here.

use crate::application::handlers::entitlement::VerificationStatus;
use crate::domain::entitlement::{Entitlement, EntitlementRecord, SubscriptionStatus};
use crate::domain::foundation::AccountId;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to grant a trial to an account.
#[derive(Debug, Clone, Deserialize)]
pub struct StartTrialRequest {
    /// The account receiving the trial.
    pub account_id: AccountId,
}

/// Request to start hosted checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// The account subscribing.
    pub account_id: AccountId,
    /// Email to prefill in the provider's checkout.
    pub account_email: String,
}

/// Request to verify a checkout session after the redirect back.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// The account that went through checkout.
    pub account_id: AccountId,
    /// Session id from the redirect URL.
    pub session_id: String,
}

/// Request to open the billing self-service portal.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalRequest {
    /// The provider's customer ref; absent for trial-only accounts.
    #[serde(default)]
    pub billing_customer_ref: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Summary of a subscription record, returned on trial creation.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummaryResponse {
    /// The account the record belongs to.
    pub account_id: String,
    /// Current status.
    pub status: SubscriptionStatus,
    /// Trial expiry (ISO 8601), if on trial.
    pub trial_end: Option<String>,
    /// Paid-through date (ISO 8601), if a subscription exists.
    pub subscription_end: Option<String>,
}

impl From<EntitlementRecord> for RecordSummaryResponse {
    fn from(record: EntitlementRecord) -> Self {
        Self {
            account_id: record.account_id.to_string(),
            status: record.status,
            trial_end: record.trial_end.map(|t| t.as_datetime().to_rfc3339()),
            subscription_end: record
                .subscription_end
                .map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

/// Evaluator output for an account.
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementResponse {
    /// Whether the account can use gated features right now.
    pub has_access: bool,
    /// Access comes from a running trial.
    pub is_trial_active: bool,
    /// Access comes from a paid (or paid-through) subscription.
    pub is_paid_active: bool,
    /// A record exists but its windows have lapsed.
    pub is_expired: bool,
    /// No record exists for this account.
    pub no_record: bool,
    /// Trial expiry (ISO 8601), if any.
    pub trial_end: Option<String>,
    /// Paid-through date (ISO 8601), if any.
    pub subscription_end: Option<String>,
}

impl From<Entitlement> for EntitlementResponse {
    fn from(entitlement: Entitlement) -> Self {
        Self {
            has_access: entitlement.has_access,
            is_trial_active: entitlement.is_trial_active,
            is_paid_active: entitlement.is_paid_active,
            is_expired: entitlement.is_expired,
            no_record: entitlement.no_record,
            trial_end: entitlement
                .trial_end
                .map(|t| t.as_datetime().to_rfc3339()),
            subscription_end: entitlement
                .subscription_end
                .map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

/// Response for checkout initiation.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    /// Provider's session id, echoed back by the success redirect.
    pub session_id: String,
    /// The hosted checkout URL to send the customer to.
    pub redirect_url: String,
}

/// Response for post-checkout verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    /// "active" when the subscription is confirmed, "unchanged" when the
    /// caller should keep polling or wait for the webhook.
    pub status: String,
}

impl From<VerificationStatus> for VerifyResponse {
    fn from(status: VerificationStatus) -> Self {
        let status = match status {
            VerificationStatus::Active => "active",
            VerificationStatus::Unchanged => "unchanged",
        };
        Self {
            status: status.to_string(),
        }
    }
}

/// Response for the billing portal.
#[derive(Debug, Clone, Serialize)]
pub struct PortalResponse {
    /// The hosted portal URL to send the customer to.
    pub redirect_url: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error response with details.
    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::evaluate;
    use crate::domain::foundation::Timestamp;

    // ════════════════════════════════════════════════════════════════════════════
    // Request DTO Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn start_trial_request_deserializes() {
        let json = r#"{"account_id": "550e8400-e29b-41d4-a716-446655440000"}"#;
        let request: StartTrialRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request.account_id.to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn start_trial_request_rejects_malformed_account_id() {
        let json = r#"{"account_id": "not-a-uuid"}"#;
        let result: Result<StartTrialRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn checkout_request_deserializes() {
        let json = r#"{
            "account_id": "550e8400-e29b-41d4-a716-446655440000",
            "account_email": "user@example.com"
        }"#;
        let request: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.account_email, "user@example.com");
    }

    #[test]
    fn verify_request_deserializes() {
        let json = r#"{
            "account_id": "550e8400-e29b-41d4-a716-446655440000",
            "session_id": "cs_test_abc123"
        }"#;
        let request: VerifyRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.session_id, "cs_test_abc123");
    }

    #[test]
    fn portal_request_defaults_missing_ref_to_none() {
        let json = r#"{}"#;
        let request: PortalRequest = serde_json::from_str(json).unwrap();
        assert!(request.billing_customer_ref.is_none());
    }

    #[test]
    fn portal_request_parses_ref() {
        let json = r#"{"billing_customer_ref": "cus_123"}"#;
        let request: PortalRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.billing_customer_ref.as_deref(), Some("cus_123"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Response DTO Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn record_summary_from_trial_record() {
        let record = EntitlementRecord::start_trial(AccountId::new(), Timestamp::now());
        let response = RecordSummaryResponse::from(record.clone());

        assert_eq!(response.account_id, record.account_id.to_string());
        assert_eq!(response.status, SubscriptionStatus::Trial);
        assert!(response.trial_end.is_some());
        assert!(response.subscription_end.is_none());
    }

    #[test]
    fn record_summary_serializes_status_as_snake_case() {
        let record = EntitlementRecord::start_trial(AccountId::new(), Timestamp::now());
        let json = serde_json::to_string(&RecordSummaryResponse::from(record)).unwrap();
        assert!(json.contains(r#""status":"trial""#));
    }

    #[test]
    fn entitlement_response_from_evaluator_output() {
        let record = EntitlementRecord::start_trial(AccountId::new(), Timestamp::now());
        let entitlement = evaluate(Some(&record), Timestamp::now());
        let response = EntitlementResponse::from(entitlement);

        assert!(response.has_access);
        assert!(response.is_trial_active);
        assert!(!response.no_record);
        assert!(response.trial_end.is_some());
    }

    #[test]
    fn entitlement_response_for_no_record() {
        let entitlement = evaluate(None, Timestamp::now());
        let response = EntitlementResponse::from(entitlement);

        assert!(!response.has_access);
        assert!(response.no_record);
        assert!(response.trial_end.is_none());
    }

    #[test]
    fn verify_response_maps_statuses() {
        assert_eq!(
            VerifyResponse::from(VerificationStatus::Active).status,
            "active"
        );
        assert_eq!(
            VerifyResponse::from(VerificationStatus::Unchanged).status,
            "unchanged"
        );
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Response Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn error_response_new_creates_response() {
        let response = ErrorResponse::new("NO_BILLING_RELATIONSHIP", "Subscribe first");
        assert_eq!(response.error_code, "NO_BILLING_RELATIONSHIP");
        assert_eq!(response.message, "Subscribe first");
        assert!(response.details.is_none());
    }

    #[test]
    fn error_response_serializes_without_details_when_none() {
        let response = ErrorResponse::new("ALREADY_EXISTS", "Record exists");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("details"));
    }

    #[test]
    fn error_response_serializes_with_details_when_present() {
        let details = serde_json::json!({"account_id": "123"});
        let response = ErrorResponse::with_details("ALREADY_EXISTS", "Record exists", details);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("details"));
    }
}
