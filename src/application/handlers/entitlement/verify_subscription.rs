//! VerifySubscriptionHandler - Command handler for post-checkout verification.
//!
//! The frontend lands back from hosted checkout with a session id and
//! asks whether the account is active yet. Usually the webhook has
//! already reconciled the payment and this is a cheap read. When the
//! webhook is still in flight, the handler pulls the session from the
//! provider and applies the activation itself; the guarded write makes
//! the two paths converge on one activation.

use std::sync::Arc;

use tracing::{info, warn};

use super::activation::{apply_checkout_activation, ActivationOutcome};
use super::notifications::send_account_notification;
use crate::domain::entitlement::{EntitlementError, SubscriptionStatus};
use crate::domain::foundation::AccountId;
use crate::ports::{
    AccountDirectory, BillingProvider, EntitlementStore, NotificationKind, NotificationSender,
};

/// Command to verify a checkout session against the account's record.
#[derive(Debug, Clone)]
pub struct VerifySubscriptionCommand {
    pub account_id: AccountId,
    pub session_id: String,
}

/// Outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The account holds an active subscription.
    Active,

    /// Nothing changed: the session is not yet paid, names a different
    /// account, or refers to a subscription that has since ended.
    Unchanged,
}

/// Result of a verification.
#[derive(Debug, Clone)]
pub struct VerifySubscriptionResult {
    pub status: VerificationStatus,
}

/// Handler for verifying a completed checkout.
pub struct VerifySubscriptionHandler {
    store: Arc<dyn EntitlementStore>,
    provider: Arc<dyn BillingProvider>,
    notifier: Arc<dyn NotificationSender>,
    directory: Arc<dyn AccountDirectory>,
}

impl VerifySubscriptionHandler {
    pub fn new(
        store: Arc<dyn EntitlementStore>,
        provider: Arc<dyn BillingProvider>,
        notifier: Arc<dyn NotificationSender>,
        directory: Arc<dyn AccountDirectory>,
    ) -> Self {
        Self {
            store,
            provider,
            notifier,
            directory,
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifySubscriptionCommand,
    ) -> Result<VerifySubscriptionResult, EntitlementError> {
        // 1. Fast path: the webhook already activated this account
        if let Some(record) = self.store.find_by_account(&cmd.account_id).await? {
            if record.status == SubscriptionStatus::Active
                && record.billing_subscription_ref.is_some()
            {
                return Ok(VerifySubscriptionResult {
                    status: VerificationStatus::Active,
                });
            }
        }

        // 2. Pull the session from the provider
        let session = self
            .provider
            .retrieve_checkout_session(&cmd.session_id)
            .await
            .map_err(|e| EntitlementError::provider_unavailable(e.to_string()))?;

        // 3. An unpaid session has no subscription yet; the webhook will
        //    finish the job if payment lands later
        let Some(subscription_ref) = session.subscription_ref else {
            info!(
                account_id = %cmd.account_id,
                session_id = %cmd.session_id,
                "Session has no subscription yet, leaving record unchanged"
            );
            return Ok(VerifySubscriptionResult {
                status: VerificationStatus::Unchanged,
            });
        };

        // 4. The session metadata must name the calling account
        if let Some(metadata_account) = session.account_id.as_deref() {
            let matches = metadata_account
                .parse::<AccountId>()
                .map(|id| id == cmd.account_id)
                .unwrap_or(false);
            if !matches {
                warn!(
                    account_id = %cmd.account_id,
                    session_id = %cmd.session_id,
                    metadata_account,
                    "Session metadata names a different account, refusing to activate"
                );
                return Ok(VerifySubscriptionResult {
                    status: VerificationStatus::Unchanged,
                });
            }
        }

        // 5. Apply the activation through the shared guarded write
        let outcome = apply_checkout_activation(
            self.store.as_ref(),
            cmd.account_id,
            session.customer_ref,
            &subscription_ref,
        )
        .await?;

        match outcome {
            ActivationOutcome::Activated(record) => {
                info!(
                    account_id = %record.account_id,
                    subscription_ref = %subscription_ref,
                    "Subscription activated via verify"
                );
                send_account_notification(
                    self.directory.as_ref(),
                    self.notifier.as_ref(),
                    record.account_id,
                    NotificationKind::SubscriptionStarted,
                )
                .await;
                Ok(VerifySubscriptionResult {
                    status: VerificationStatus::Active,
                })
            }
            ActivationOutcome::AlreadyActive(_) => Ok(VerifySubscriptionResult {
                status: VerificationStatus::Active,
            }),
            ActivationOutcome::Stale => Ok(VerifySubscriptionResult {
                status: VerificationStatus::Unchanged,
            }),
        }
    }
}
