//! Integration tests for the subscription entitlement lifecycle.
//!
//! These tests verify the end-to-end flows across handlers and adapters:
//! 1. Trial grant, evaluation, and expiry
//! 2. Checkout initiation, webhook-driven activation, and notification
//! 3. Post-redirect verification as a fallback when the webhook is late
//! 4. Provider status sync and subscription termination
//! 5. Redelivered and out-of-order webhook convergence
//!
//! Uses the in-memory store and the mock billing provider, so there are no
//! external dependencies. The notification and directory ports get local
//! recording doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use jobsheet_pro::adapters::entitlement::InMemoryEntitlementStore;
use jobsheet_pro::adapters::stripe::MockBillingProvider;
use jobsheet_pro::application::{
    CheckEntitlementHandler, CheckEntitlementQuery, GrantTrialCommand, GrantTrialHandler,
    OpenPortalCommand, OpenPortalHandler, ReconcileWebhookCommand, ReconcileWebhookHandler,
    ReconcileWebhookResult, StartCheckoutCommand, StartCheckoutHandler, VerificationStatus,
    VerifySubscriptionCommand, VerifySubscriptionHandler,
};
use jobsheet_pro::domain::entitlement::{
    Entitlement, EntitlementError, EntitlementRecord, SubscriptionStatus, WebhookError,
};
use jobsheet_pro::domain::foundation::{AccountId, Timestamp};
use jobsheet_pro::ports::{
    AccountDirectory, BillingEvent, CheckoutSessionDetails, DirectoryError, EntitlementStore,
    NotificationError, NotificationKind, NotificationSender, ProviderStatus,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Notification sender that records every delivery
#[derive(Default)]
struct RecordingMailbox {
    sent: Mutex<Vec<(String, NotificationKind)>>,
}

impl RecordingMailbox {
    fn sent(&self) -> Vec<(String, NotificationKind)> {
        self.sent.lock().unwrap().clone()
    }

    fn count(&self, kind: NotificationKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }
}

#[async_trait]
impl NotificationSender for RecordingMailbox {
    async fn notify(&self, email: &str, kind: NotificationKind) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push((email.to_string(), kind));
        Ok(())
    }
}

/// Account directory backed by a fixed map
#[derive(Default)]
struct StaticDirectory {
    emails: Mutex<HashMap<AccountId, String>>,
}

impl StaticDirectory {
    fn add(&self, account_id: AccountId, email: &str) {
        self.emails
            .lock()
            .unwrap()
            .insert(account_id, email.to_string());
    }
}

#[async_trait]
impl AccountDirectory for StaticDirectory {
    async fn find_email(&self, account_id: &AccountId) -> Result<Option<String>, DirectoryError> {
        Ok(self.emails.lock().unwrap().get(account_id).cloned())
    }
}

/// Shared wiring for one test: real handlers over in-memory adapters
struct Harness {
    store: Arc<InMemoryEntitlementStore>,
    provider: Arc<MockBillingProvider>,
    mailbox: Arc<RecordingMailbox>,
    directory: Arc<StaticDirectory>,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(InMemoryEntitlementStore::new()),
            provider: Arc::new(MockBillingProvider::new()),
            mailbox: Arc::new(RecordingMailbox::default()),
            directory: Arc::new(StaticDirectory::default()),
        }
    }

    /// Register an account in the directory and return its id.
    fn account(&self, email: &str) -> AccountId {
        let id = AccountId::new();
        self.directory.add(id, email);
        id
    }

    fn grant_trial(&self) -> GrantTrialHandler {
        GrantTrialHandler::new(self.store.clone())
    }

    fn check(&self) -> CheckEntitlementHandler {
        CheckEntitlementHandler::new(self.store.clone())
    }

    fn start_checkout(&self) -> StartCheckoutHandler {
        StartCheckoutHandler::new(self.provider.clone())
    }

    fn verify(&self) -> VerifySubscriptionHandler {
        VerifySubscriptionHandler::new(
            self.store.clone(),
            self.provider.clone(),
            self.mailbox.clone(),
            self.directory.clone(),
        )
    }

    fn reconcile(&self) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(
            self.store.clone(),
            self.provider.clone(),
            self.mailbox.clone(),
            self.directory.clone(),
        )
    }

    fn portal(&self) -> OpenPortalHandler {
        OpenPortalHandler::new(self.provider.clone(), "https://example.com/account".to_string())
    }

    /// Deliver a webhook event through the reconciler.
    ///
    /// The mock provider accepts any signature and returns the configured
    /// event, so the payload here stands in for the raw request body.
    async fn deliver(&self, event: BillingEvent) -> Result<ReconcileWebhookResult, WebhookError> {
        self.provider.set_webhook_event(event);
        self.reconcile()
            .handle(ReconcileWebhookCommand {
                payload: b"{}".to_vec(),
                signature: "t=0,v1=test".to_string(),
            })
            .await
    }

    async fn entitlement(&self, account_id: AccountId) -> Entitlement {
        self.check()
            .handle(CheckEntitlementQuery { account_id })
            .await
            .unwrap()
    }

    async fn record(&self, account_id: AccountId) -> EntitlementRecord {
        self.store
            .find_by_account(&account_id)
            .await
            .unwrap()
            .expect("record should exist")
    }
}

/// A trial record whose window already passed.
fn expired_trial(account_id: AccountId) -> EntitlementRecord {
    EntitlementRecord::start_trial(account_id, Timestamp::now().add_hours(-100))
}

// =============================================================================
// Trial Lifecycle
// =============================================================================

/// Tests that a trial grant opens a 72-hour access window and that the
/// grant can never be repeated for the same account
#[tokio::test]
async fn trial_grant_gives_access_exactly_once() {
    let harness = Harness::new();
    let account_id = harness.account("jo@example.com");

    let granted = harness
        .grant_trial()
        .handle(GrantTrialCommand { account_id })
        .await
        .unwrap();

    assert_eq!(granted.record.status, SubscriptionStatus::Trial);

    let entitlement = harness.entitlement(account_id).await;
    assert!(entitlement.has_access);
    assert!(entitlement.is_trial_active);
    assert!(!entitlement.is_paid_active);
    assert_eq!(entitlement.trial_end, granted.record.trial_end);

    // A second grant must not reset the window
    let second = harness
        .grant_trial()
        .handle(GrantTrialCommand { account_id })
        .await;
    assert!(matches!(second, Err(EntitlementError::AlreadyExists(_))));
}

/// Tests that a lapsed trial denies access and reports expiry rather
/// than absence
#[tokio::test]
async fn expired_trial_denies_access() {
    let harness = Harness::new();
    let account_id = harness.account("jo@example.com");
    harness.store.insert(&expired_trial(account_id)).await.unwrap();

    let entitlement = harness.entitlement(account_id).await;

    assert!(!entitlement.has_access);
    assert!(entitlement.is_expired);
    assert!(!entitlement.no_record);
}

/// Tests that an account with no record at all is denied with the
/// distinct no-record marker
#[tokio::test]
async fn unknown_account_has_no_access() {
    let harness = Harness::new();

    let entitlement = harness.entitlement(AccountId::new()).await;

    assert!(!entitlement.has_access);
    assert!(entitlement.no_record);
    assert!(!entitlement.is_expired);
}

// =============================================================================
// Checkout and Webhook Activation
// =============================================================================

/// Tests the happy path: checkout session created, provider confirms via
/// webhook, record activates, exactly one welcome email goes out
#[tokio::test]
async fn checkout_to_webhook_activation_end_to_end() {
    let harness = Harness::new();
    let account_id = harness.account("buyer@example.com");
    harness.store.insert(&expired_trial(account_id)).await.unwrap();

    // 1. Start checkout; the session carries the account correlation
    let started = harness
        .start_checkout()
        .handle(StartCheckoutCommand {
            account_id,
            email: "buyer@example.com".to_string(),
        })
        .await
        .unwrap();
    assert!(started.session.url.contains(&started.session.id));

    let calls = harness.provider.calls();
    assert_eq!(calls[0].method, "create_checkout_session");
    assert_eq!(calls[0].args[0], account_id.to_string());

    // 2. Provider confirms payment asynchronously
    let result = harness
        .deliver(MockBillingProvider::checkout_completed_event(
            &account_id,
            "cus_101",
            "sub_101",
        ))
        .await
        .unwrap();
    assert!(matches!(result, ReconcileWebhookResult::Activated { .. }));

    // 3. The account now holds a paid window
    let entitlement = harness.entitlement(account_id).await;
    assert!(entitlement.has_access);
    assert!(entitlement.is_paid_active);
    assert!(!entitlement.is_trial_active);

    let record = harness.record(account_id).await;
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(record.billing_customer_ref.as_deref(), Some("cus_101"));
    assert_eq!(record.billing_subscription_ref.as_deref(), Some("sub_101"));

    // 4. Exactly one welcome email, to the directory address
    assert_eq!(
        harness.mailbox.sent(),
        vec![(
            "buyer@example.com".to_string(),
            NotificationKind::SubscriptionStarted
        )]
    );
}

/// Tests that redelivering the same checkout event changes nothing and
/// sends no further email
#[tokio::test]
async fn redelivered_checkout_activates_only_once() {
    let harness = Harness::new();
    let account_id = harness.account("buyer@example.com");
    harness.store.insert(&expired_trial(account_id)).await.unwrap();

    let event =
        MockBillingProvider::checkout_completed_event(&account_id, "cus_202", "sub_202");

    let first = harness.deliver(event.clone()).await.unwrap();
    assert!(matches!(first, ReconcileWebhookResult::Activated { .. }));
    let after_first = harness.record(account_id).await;

    for _ in 0..2 {
        let redelivered = harness.deliver(event.clone()).await.unwrap();
        assert!(matches!(
            redelivered,
            ReconcileWebhookResult::AlreadyActive { .. }
        ));
    }

    let after_redelivery = harness.record(account_id).await;
    assert_eq!(after_redelivery, after_first);
    assert_eq!(
        harness.mailbox.count(NotificationKind::SubscriptionStarted),
        1
    );
}

/// Tests that checkout completion for an account with no prior record
/// creates one directly in the active state
#[tokio::test]
async fn webhook_activation_creates_record_when_none_exists() {
    let harness = Harness::new();
    let account_id = harness.account("fresh@example.com");

    let result = harness
        .deliver(MockBillingProvider::checkout_completed_event(
            &account_id,
            "cus_303",
            "sub_303",
        ))
        .await
        .unwrap();

    assert!(matches!(result, ReconcileWebhookResult::Activated { .. }));
    let record = harness.record(account_id).await;
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert!(record.trial_end.is_none());
}

// =============================================================================
// Post-Redirect Verification
// =============================================================================

/// Tests the fallback path: the user returns from checkout before the
/// webhook lands, and verification activates from the session itself
#[tokio::test]
async fn verify_session_activates_when_webhook_is_late() {
    let harness = Harness::new();
    let account_id = harness.account("eager@example.com");
    harness.store.insert(&expired_trial(account_id)).await.unwrap();

    harness.provider.set_session_details(CheckoutSessionDetails {
        id: "cs_late_hook".to_string(),
        customer_ref: Some("cus_404".to_string()),
        subscription_ref: Some("sub_404".to_string()),
        account_id: Some(account_id.to_string()),
    });

    // 1. Post-redirect verify activates the record
    let verified = harness
        .verify()
        .handle(VerifySubscriptionCommand {
            account_id,
            session_id: "cs_late_hook".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(verified.status, VerificationStatus::Active);
    assert!(harness.entitlement(account_id).await.is_paid_active);

    // 2. The webhook arrives afterwards and is a no-op
    let late = harness
        .deliver(MockBillingProvider::checkout_completed_event(
            &account_id,
            "cus_404",
            "sub_404",
        ))
        .await
        .unwrap();
    assert!(matches!(late, ReconcileWebhookResult::AlreadyActive { .. }));

    // One email total across both paths
    assert_eq!(
        harness.mailbox.count(NotificationKind::SubscriptionStarted),
        1
    );
}

/// Tests that a session naming a different account does not touch the
/// caller's record
#[tokio::test]
async fn verify_refuses_session_for_other_account() {
    let harness = Harness::new();
    let account_id = harness.account("honest@example.com");
    let other_account = AccountId::new();
    harness.store.insert(&expired_trial(account_id)).await.unwrap();

    harness.provider.set_session_details(CheckoutSessionDetails {
        id: "cs_not_yours".to_string(),
        customer_ref: Some("cus_505".to_string()),
        subscription_ref: Some("sub_505".to_string()),
        account_id: Some(other_account.to_string()),
    });

    let verified = harness
        .verify()
        .handle(VerifySubscriptionCommand {
            account_id,
            session_id: "cs_not_yours".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(verified.status, VerificationStatus::Unchanged);
    let record = harness.record(account_id).await;
    assert_eq!(record.status, SubscriptionStatus::Trial);
    assert!(harness.mailbox.sent().is_empty());
}

// =============================================================================
// Status Sync and Termination
// =============================================================================

/// Tests that a provider-side lapse records canceled intent while the
/// already-paid window stays open
#[tokio::test]
async fn status_change_keeps_paid_window_open() {
    let harness = Harness::new();
    let account_id = harness.account("lapsed@example.com");
    let record = EntitlementRecord::activated(
        account_id,
        Some("cus_606".to_string()),
        "sub_606".to_string(),
        Timestamp::now(),
    );
    harness.store.insert(&record).await.unwrap();

    let result = harness
        .deliver(MockBillingProvider::subscription_updated_event(
            "sub_606",
            ProviderStatus::PastDue,
        ))
        .await
        .unwrap();

    assert!(matches!(
        result,
        ReconcileWebhookResult::StatusSynced {
            status: SubscriptionStatus::Canceled,
            ..
        }
    ));

    // Intent is canceled, access survives to the end of the paid window
    let updated = harness.record(account_id).await;
    assert_eq!(updated.status, SubscriptionStatus::Canceled);
    assert_eq!(updated.subscription_end, record.subscription_end);
    assert!(harness.entitlement(account_id).await.has_access);

    // Status sync never emails
    assert!(harness.mailbox.sent().is_empty());
}

/// Tests the full lifecycle: activation, termination with a single
/// cancellation email, and a stale checkout redelivery that must not
/// resurrect the dead subscription
#[tokio::test]
async fn full_lifecycle_activation_to_cancellation() {
    let harness = Harness::new();
    let account_id = harness.account("member@example.com");

    let checkout_event =
        MockBillingProvider::checkout_completed_event(&account_id, "cus_707", "sub_707");

    // 1. Activate via webhook
    harness.deliver(checkout_event.clone()).await.unwrap();
    assert!(harness.entitlement(account_id).await.has_access);

    // 2. Provider terminates the subscription
    let deleted = harness
        .deliver(MockBillingProvider::subscription_deleted_event("sub_707"))
        .await
        .unwrap();
    assert!(matches!(deleted, ReconcileWebhookResult::Canceled { .. }));

    let entitlement = harness.entitlement(account_id).await;
    assert!(!entitlement.has_access);
    assert!(entitlement.is_expired);
    assert_eq!(
        harness.mailbox.count(NotificationKind::SubscriptionCanceled),
        1
    );

    // 3. Redelivered termination is a no-op for notifications
    harness
        .deliver(MockBillingProvider::subscription_deleted_event("sub_707"))
        .await
        .unwrap();
    assert_eq!(
        harness.mailbox.count(NotificationKind::SubscriptionCanceled),
        1
    );

    // 4. A stale checkout redelivery must not reactivate the account
    let stale = harness.deliver(checkout_event).await.unwrap();
    assert!(matches!(stale, ReconcileWebhookResult::Acknowledged));

    let record = harness.record(account_id).await;
    assert_eq!(record.status, SubscriptionStatus::Canceled);
    assert!(!harness.entitlement(account_id).await.has_access);
    assert_eq!(
        harness.mailbox.count(NotificationKind::SubscriptionStarted),
        1
    );
}

/// Tests that an event for a subscription we never recorded is
/// acknowledged without creating state
#[tokio::test]
async fn event_for_unknown_subscription_is_acknowledged() {
    let harness = Harness::new();

    let result = harness
        .deliver(MockBillingProvider::subscription_deleted_event(
            "sub_never_seen",
        ))
        .await
        .unwrap();

    assert!(matches!(result, ReconcileWebhookResult::Acknowledged));
    assert_eq!(harness.store.record_count().await, 0);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Tests that the verify endpoint and the webhook racing over the same
/// checkout converge on one active record and one email
#[tokio::test]
async fn concurrent_verify_and_webhook_converge() {
    let harness = Harness::new();
    let account_id = harness.account("racer@example.com");
    harness.store.insert(&expired_trial(account_id)).await.unwrap();

    harness.provider.set_session_details(CheckoutSessionDetails {
        id: "cs_race".to_string(),
        customer_ref: Some("cus_808".to_string()),
        subscription_ref: Some("sub_808".to_string()),
        account_id: Some(account_id.to_string()),
    });
    harness
        .provider
        .set_webhook_event(MockBillingProvider::checkout_completed_event(
            &account_id,
            "cus_808",
            "sub_808",
        ));

    let verify = harness.verify();
    let reconcile = harness.reconcile();

    let (verified, reconciled) = tokio::join!(
        verify.handle(VerifySubscriptionCommand {
            account_id,
            session_id: "cs_race".to_string(),
        }),
        reconcile.handle(ReconcileWebhookCommand {
            payload: b"{}".to_vec(),
            signature: "t=0,v1=test".to_string(),
        })
    );

    // Both paths succeed regardless of interleaving
    assert_eq!(verified.unwrap().status, VerificationStatus::Active);
    assert!(reconciled.is_ok());

    // And converge on a single activation
    let record = harness.record(account_id).await;
    assert_eq!(record.status, SubscriptionStatus::Active);
    assert_eq!(record.billing_subscription_ref.as_deref(), Some("sub_808"));
    assert_eq!(
        harness.mailbox.count(NotificationKind::SubscriptionStarted),
        1
    );
}

// =============================================================================
// Billing Portal
// =============================================================================

/// Tests that the portal opens only for accounts with a billing
/// relationship
#[tokio::test]
async fn portal_requires_billing_relationship() {
    let harness = Harness::new();

    // Trial-only accounts have no customer ref
    let refused = harness
        .portal()
        .handle(OpenPortalCommand {
            billing_customer_ref: None,
        })
        .await;
    assert!(matches!(
        refused,
        Err(EntitlementError::NoBillingRelationship)
    ));
    assert!(!harness.provider.was_called("create_portal_session"));

    // A paying account gets a session back
    let opened = harness
        .portal()
        .handle(OpenPortalCommand {
            billing_customer_ref: Some("cus_909".to_string()),
        })
        .await
        .unwrap();
    assert!(opened.session.url.contains(&opened.session.id));

    let calls = harness.provider.calls();
    let portal_call = calls
        .iter()
        .find(|c| c.method == "create_portal_session")
        .expect("portal session should have been requested");
    assert_eq!(portal_call.args[0], "cus_909");
    assert_eq!(portal_call.args[1], "https://example.com/account");
}
