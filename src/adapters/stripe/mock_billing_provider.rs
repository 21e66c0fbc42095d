//! Mock billing provider for testing.
//!
//! Provides a configurable mock implementation of `BillingProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured responses
//! - Error injection
//! - Call tracking
//! - Webhook event simulation

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::entitlement::WebhookError;
use crate::domain::foundation::AccountId;
use crate::ports::{
    BillingError, BillingEvent, BillingEventData, BillingEventKind, BillingProvider,
    CheckoutSession, CheckoutSessionDetails, CreateCheckoutRequest, PortalSession, ProviderStatus,
};

/// Mock billing provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockBillingProvider::new();
///
/// // Configure responses
/// mock.set_session_details(CheckoutSessionDetails { id: "cs_123".into(), ... });
///
/// // Inject errors
/// mock.set_error(BillingError::network("Test outage"));
///
/// // Use in tests
/// let result = mock.retrieve_checkout_session("cs_123").await;
/// ```
#[derive(Default)]
pub struct MockBillingProvider {
    /// Mutable behavior knobs, lockable from async tests.
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    /// Pre-configured session details by session id.
    session_details: HashMap<String, CheckoutSessionDetails>,

    /// Next checkout session to return.
    next_checkout: Option<CheckoutSession>,

    /// Next portal session to return.
    next_portal: Option<PortalSession>,

    /// Next webhook event to return.
    next_webhook_event: Option<BillingEvent>,

    /// Error to return on next call.
    next_error: Option<BillingError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, BillingError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// Webhook verification behavior.
    webhook_verify_mode: WebhookVerifyMode,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// How to handle webhook verification.
#[derive(Default, Clone)]
enum WebhookVerifyMode {
    /// Accept any payload and return the configured event.
    #[default]
    AcceptAll,

    /// Always fail verification.
    AlwaysFail,
}

impl MockBillingProvider {
    /// Mock with canned sessions and no staged failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose webhook verification always refuses the payload.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().webhook_verify_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set the checkout session to return on next `create_checkout_session` call.
    pub fn set_checkout_session(&self, session: CheckoutSession) {
        self.inner.lock().unwrap().next_checkout = Some(session);
    }

    /// Add retrievable session details, keyed by session id.
    pub fn set_session_details(&self, details: CheckoutSessionDetails) {
        let id = details.id.clone();
        self.inner.lock().unwrap().session_details.insert(id, details);
    }

    /// Set the portal session to return.
    pub fn set_portal_session(&self, session: PortalSession) {
        self.inner.lock().unwrap().next_portal = Some(session);
    }

    /// Stages the event every later verification call yields.
    pub fn set_webhook_event(&self, event: BillingEvent) {
        self.inner.lock().unwrap().next_webhook_event = Some(event);
    }

    /// Stages a failure for the next provider call.
    pub fn set_error(&self, error: BillingError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: BillingError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .any(|c| c.method == method)
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), BillingError> {
        let mut state = self.inner.lock().unwrap();

        // Check method-specific error first
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Check global error (consumes it)
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }

    fn short_id() -> String {
        uuid::Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap()
            .to_string()
    }
}

impl Clone for MockBillingProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        self.record_call(
            "create_checkout_session",
            vec![request.account_id.to_string(), request.email.clone()],
        );
        self.check_error("create_checkout_session")?;

        let mut state = self.inner.lock().unwrap();

        let session = state.next_checkout.take().unwrap_or_else(|| {
            let id = format!("cs_mock_{}", Self::short_id());
            CheckoutSession {
                url: format!("https://checkout.stripe.com/c/pay/{}", id),
                id,
            }
        });

        Ok(session)
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSessionDetails, BillingError> {
        self.record_call("retrieve_checkout_session", vec![session_id.to_string()]);
        self.check_error("retrieve_checkout_session")?;

        let state = self.inner.lock().unwrap();

        // Configured details win; otherwise synthesize a completed session
        let details = state
            .session_details
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| CheckoutSessionDetails {
                id: session_id.to_string(),
                customer_ref: Some(format!("cus_mock_{}", Self::short_id())),
                subscription_ref: Some(format!("sub_mock_{}", Self::short_id())),
                account_id: None,
            });

        Ok(details)
    }

    async fn create_portal_session(
        &self,
        customer_ref: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        self.record_call(
            "create_portal_session",
            vec![customer_ref.to_string(), return_url.to_string()],
        );
        self.check_error("create_portal_session")?;

        let mut state = self.inner.lock().unwrap();

        let session = state.next_portal.take().unwrap_or_else(|| {
            let id = format!("bps_mock_{}", Self::short_id());
            PortalSession {
                url: format!("https://billing.stripe.com/p/session/{}", id),
                id,
            }
        });

        Ok(session)
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<BillingEvent, WebhookError> {
        self.record_call(
            "verify_webhook",
            vec![
                String::from_utf8_lossy(payload).chars().take(50).collect(),
                signature.chars().take(20).collect(),
            ],
        );

        let state = self.inner.lock().unwrap();

        match &state.webhook_verify_mode {
            WebhookVerifyMode::AcceptAll => {}
            WebhookVerifyMode::AlwaysFail => {
                return Err(WebhookError::InvalidSignature);
            }
        }

        // Return configured event or parse an envelope from the payload
        if let Some(event) = &state.next_webhook_event {
            return Ok(event.clone());
        }

        let parsed: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        let id = parsed["id"].as_str().unwrap_or("evt_mock").to_string();
        let event_type = parsed["type"].as_str().unwrap_or("unknown");
        let created = parsed["created"]
            .as_i64()
            .unwrap_or_else(|| chrono::Utc::now().timestamp());

        let kind = match event_type {
            "checkout.session.completed" => BillingEventKind::CheckoutCompleted,
            "customer.subscription.updated" => BillingEventKind::SubscriptionUpdated,
            "customer.subscription.deleted" => BillingEventKind::SubscriptionDeleted,
            other => BillingEventKind::Unknown(other.to_string()),
        };

        Ok(BillingEvent {
            id,
            kind,
            data: BillingEventData::Raw {
                json: String::from_utf8_lossy(payload).to_string(),
            },
            created_at: created,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Test Helpers
// ════════════════════════════════════════════════════════════════════════════════

impl MockBillingProvider {
    /// Builds a checkout completion event fixture.
    pub fn checkout_completed_event(
        account_id: &AccountId,
        customer_ref: &str,
        subscription_ref: &str,
    ) -> BillingEvent {
        BillingEvent {
            id: format!("evt_checkout_{}", uuid::Uuid::new_v4()),
            kind: BillingEventKind::CheckoutCompleted,
            data: BillingEventData::Checkout {
                session_id: format!("cs_{}", uuid::Uuid::new_v4()),
                customer_ref: Some(customer_ref.to_string()),
                subscription_ref: Some(subscription_ref.to_string()),
                account_id: Some(account_id.to_string()),
            },
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Create a subscription updated webhook event.
    pub fn subscription_updated_event(
        subscription_ref: &str,
        status: ProviderStatus,
    ) -> BillingEvent {
        BillingEvent {
            id: format!("evt_upd_{}", uuid::Uuid::new_v4()),
            kind: BillingEventKind::SubscriptionUpdated,
            data: BillingEventData::Subscription {
                subscription_ref: subscription_ref.to_string(),
                customer_ref: None,
                status,
            },
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Builds a subscription deletion event fixture.
    pub fn subscription_deleted_event(subscription_ref: &str) -> BillingEvent {
        BillingEvent {
            id: format!("evt_del_{}", uuid::Uuid::new_v4()),
            kind: BillingEventKind::SubscriptionDeleted,
            data: BillingEventData::Subscription {
                subscription_ref: subscription_ref.to_string(),
                customer_ref: None,
                status: ProviderStatus::Canceled,
            },
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::BillingErrorCode;

    fn test_request() -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            account_id: AccountId::new(),
            email: "test@example.com".to_string(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Basic Operation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_checkout_returns_mock_session() {
        let mock = MockBillingProvider::new();

        let session = mock.create_checkout_session(test_request()).await.unwrap();

        assert!(session.id.starts_with("cs_mock_"));
        assert!(session.url.contains(&session.id));
    }

    #[tokio::test]
    async fn retrieve_synthesizes_completed_session() {
        let mock = MockBillingProvider::new();

        let details = mock.retrieve_checkout_session("cs_abc").await.unwrap();

        assert_eq!(details.id, "cs_abc");
        assert!(details.customer_ref.is_some());
        assert!(details.subscription_ref.is_some());
    }

    #[tokio::test]
    async fn retrieve_returns_configured_details() {
        let mock = MockBillingProvider::new();
        mock.set_session_details(CheckoutSessionDetails {
            id: "cs_configured".to_string(),
            customer_ref: Some("cus_1".to_string()),
            subscription_ref: None,
            account_id: Some("acct-meta".to_string()),
        });

        let details = mock
            .retrieve_checkout_session("cs_configured")
            .await
            .unwrap();

        assert!(details.subscription_ref.is_none());
        assert_eq!(details.account_id.as_deref(), Some("acct-meta"));
    }

    #[tokio::test]
    async fn portal_session_records_arguments() {
        let mock = MockBillingProvider::new();

        mock.create_portal_session("cus_1", "https://example.com/account")
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "create_portal_session");
        assert_eq!(calls[0].args[0], "cus_1");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Injection Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn set_error_fails_next_call_only() {
        let mock = MockBillingProvider::new();
        mock.set_error(BillingError::network("simulated outage"));

        let first = mock.create_checkout_session(test_request()).await;
        let second = mock.create_checkout_session(test_request()).await;

        assert_eq!(first.unwrap_err().code, BillingErrorCode::NetworkError);
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn method_error_persists_across_calls() {
        let mock = MockBillingProvider::new();
        mock.set_method_error(
            "retrieve_checkout_session",
            BillingError::rate_limited("slow down"),
        );

        assert!(mock.retrieve_checkout_session("cs_1").await.is_err());
        assert!(mock.retrieve_checkout_session("cs_2").await.is_err());
        // Other methods unaffected
        assert!(mock.create_checkout_session(test_request()).await.is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn webhook_returns_configured_event() {
        let mock = MockBillingProvider::new();
        let account_id = AccountId::new();
        mock.set_webhook_event(MockBillingProvider::checkout_completed_event(
            &account_id,
            "cus_1",
            "sub_1",
        ));

        let event = mock.verify_webhook(b"{}", "sig").await.unwrap();

        assert_eq!(event.kind, BillingEventKind::CheckoutCompleted);
        match event.data {
            BillingEventData::Checkout { account_id: id, .. } => {
                assert_eq!(id.as_deref(), Some(account_id.to_string().as_str()));
            }
            _ => panic!("Expected Checkout data"),
        }
    }

    #[tokio::test]
    async fn webhook_parses_envelope_when_unconfigured() {
        let mock = MockBillingProvider::new();
        let payload = br#"{"id":"evt_raw","type":"customer.subscription.deleted","created":1704067200}"#;

        let event = mock.verify_webhook(payload, "sig").await.unwrap();

        assert_eq!(event.id, "evt_raw");
        assert_eq!(event.kind, BillingEventKind::SubscriptionDeleted);
    }

    #[tokio::test]
    async fn rejecting_mock_fails_verification() {
        let mock = MockBillingProvider::rejecting_webhooks();

        let result = mock.verify_webhook(b"{}", "sig").await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[tokio::test]
    async fn call_count_tracks_per_method() {
        let mock = MockBillingProvider::new();

        let _ = mock.retrieve_checkout_session("cs_1").await;
        let _ = mock.retrieve_checkout_session("cs_2").await;
        let _ = mock.create_checkout_session(test_request()).await;

        assert_eq!(mock.call_count("retrieve_checkout_session"), 2);
        assert_eq!(mock.call_count("create_checkout_session"), 1);
        assert!(!mock.was_called("create_portal_session"));
    }
}
