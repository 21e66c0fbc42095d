//! ReconcileWebhookHandler - Command handler for billing provider webhooks.
//!
//! The provider's event stream is the authority on subscription state.
//! Every arm is idempotent against redelivery: activation checks the
//! record before writing, status syncs converge on the latest provider
//! status, and cancellation notifications fire only on the transition
//! out of active. Events we cannot apply (unknown account, unknown
//! subscription ref, unrecognized kind) are acknowledged so the
//! provider stops redelivering them; only store failures surface as
//! errors, which the provider answers with redelivery.

use std::sync::Arc;

use tracing::{info, warn};

use super::activation::{apply_checkout_activation, ActivationOutcome, MAX_WRITE_ATTEMPTS};
use super::notifications::send_account_notification;
use crate::domain::entitlement::{SubscriptionStatus, WebhookError};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::{
    AccountDirectory, BillingEvent, BillingEventData, BillingEventKind, BillingProvider,
    EntitlementStore, NotificationKind, NotificationSender, ProviderStatus, StoreError,
};

/// Command to reconcile one webhook delivery.
#[derive(Debug, Clone)]
pub struct ReconcileWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header value.
    pub signature: String,
}

/// What the reconciliation did.
#[derive(Debug, Clone)]
pub enum ReconcileWebhookResult {
    /// Checkout confirmed, record transitioned to active.
    Activated { account_id: AccountId },
    /// Redelivered checkout for an already-active record.
    AlreadyActive { account_id: AccountId },
    /// Provider status change recorded.
    StatusSynced {
        account_id: AccountId,
        status: SubscriptionStatus,
    },
    /// Subscription ended, record canceled.
    Canceled { account_id: AccountId },
    /// Authentic event we could not apply; acknowledged as done.
    Acknowledged,
    /// Unrecognized event kind.
    Ignored,
}

/// Handler for reconciling billing webhooks against entitlement records.
pub struct ReconcileWebhookHandler {
    store: Arc<dyn EntitlementStore>,
    provider: Arc<dyn BillingProvider>,
    notifier: Arc<dyn NotificationSender>,
    directory: Arc<dyn AccountDirectory>,
}

impl ReconcileWebhookHandler {
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
        cmd: ReconcileWebhookCommand,
    ) -> Result<ReconcileWebhookResult, WebhookError> {
        // 1. Authenticate the delivery and parse the event
        let event = self
            .provider
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await?;

        // 2. Route on event kind
        match &event.kind {
            BillingEventKind::CheckoutCompleted => self.handle_checkout_completed(&event).await,
            BillingEventKind::SubscriptionUpdated => self.handle_subscription_updated(&event).await,
            BillingEventKind::SubscriptionDeleted => self.handle_subscription_deleted(&event).await,
            BillingEventKind::Unknown(kind) => {
                info!(event_id = %event.id, kind, "Ignoring unrecognized webhook event");
                Ok(ReconcileWebhookResult::Ignored)
            }
        }
    }

    async fn handle_checkout_completed(
        &self,
        event: &BillingEvent,
    ) -> Result<ReconcileWebhookResult, WebhookError> {
        let BillingEventData::Checkout {
            session_id,
            customer_ref,
            subscription_ref,
            account_id,
        } = &event.data
        else {
            return Err(WebhookError::MalformedPayload(
                "checkout event carried non-checkout data".to_string(),
            ));
        };

        // The correlation metadata is the only account linkage. Without
        // it the payment is real but unattributable; acknowledge so the
        // provider stops redelivering.
        let Some(account_raw) = account_id else {
            warn!(
                event_id = %event.id,
                session_id = %session_id,
                "Checkout completed without account metadata, cannot attribute"
            );
            return Ok(ReconcileWebhookResult::Acknowledged);
        };
        let account_id = match account_raw.parse::<AccountId>() {
            Ok(id) => id,
            Err(_) => {
                warn!(
                    event_id = %event.id,
                    session_id = %session_id,
                    account_raw = %account_raw,
                    "Checkout metadata is not a valid account id, cannot attribute"
                );
                return Ok(ReconcileWebhookResult::Acknowledged);
            }
        };

        // A completed session with no subscription grants nothing
        let Some(subscription_ref) = subscription_ref.as_deref() else {
            warn!(
                event_id = %event.id,
                session_id = %session_id,
                account_id = %account_id,
                "Checkout completed without a subscription, nothing to activate"
            );
            return Ok(ReconcileWebhookResult::Acknowledged);
        };

        let outcome = apply_checkout_activation(
            self.store.as_ref(),
            account_id,
            customer_ref.clone(),
            subscription_ref,
        )
        .await?;

        match outcome {
            ActivationOutcome::Activated(record) => {
                info!(
                    event_id = %event.id,
                    account_id = %record.account_id,
                    subscription_ref = %subscription_ref,
                    "Subscription activated via webhook"
                );
                send_account_notification(
                    self.directory.as_ref(),
                    self.notifier.as_ref(),
                    record.account_id,
                    NotificationKind::SubscriptionStarted,
                )
                .await;
                Ok(ReconcileWebhookResult::Activated {
                    account_id: record.account_id,
                })
            }
            ActivationOutcome::AlreadyActive(record) => {
                info!(
                    event_id = %event.id,
                    account_id = %record.account_id,
                    "Redelivered checkout for active record, no-op"
                );
                Ok(ReconcileWebhookResult::AlreadyActive {
                    account_id: record.account_id,
                })
            }
            ActivationOutcome::Stale => {
                info!(
                    event_id = %event.id,
                    account_id = %account_id,
                    "Checkout refers to an ended subscription, no-op"
                );
                Ok(ReconcileWebhookResult::Acknowledged)
            }
        }
    }

    async fn handle_subscription_updated(
        &self,
        event: &BillingEvent,
    ) -> Result<ReconcileWebhookResult, WebhookError> {
        let BillingEventData::Subscription {
            subscription_ref,
            status,
            ..
        } = &event.data
        else {
            return Err(WebhookError::MalformedPayload(
                "subscription event carried non-subscription data".to_string(),
            ));
        };

        // Anything short of active is recorded as canceled intent. The
        // access window is untouched: payment already covered it, and a
        // past-due grace decision belongs to the provider, not us.
        let new_status = match status {
            ProviderStatus::Active => SubscriptionStatus::Active,
            _ => SubscriptionStatus::Canceled,
        };

        for _attempt in 0..MAX_WRITE_ATTEMPTS {
            let Some(existing) = self.store.find_by_subscription_ref(subscription_ref).await?
            else {
                warn!(
                    event_id = %event.id,
                    subscription_ref = %subscription_ref,
                    "No record for updated subscription, acknowledging"
                );
                return Ok(ReconcileWebhookResult::Acknowledged);
            };

            let expected = existing.updated_at;
            let mut record = existing;
            record.apply_provider_status(new_status, Timestamp::now());

            match self.store.update(&record, expected).await {
                Ok(()) => {
                    info!(
                        event_id = %event.id,
                        account_id = %record.account_id,
                        ?new_status,
                        "Subscription status synced"
                    );
                    return Ok(ReconcileWebhookResult::StatusSynced {
                        account_id: record.account_id,
                        status: new_status,
                    });
                }
                Err(StoreError::WriteConflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::WriteConflict.into())
    }

    async fn handle_subscription_deleted(
        &self,
        event: &BillingEvent,
    ) -> Result<ReconcileWebhookResult, WebhookError> {
        let BillingEventData::Subscription {
            subscription_ref, ..
        } = &event.data
        else {
            return Err(WebhookError::MalformedPayload(
                "subscription event carried non-subscription data".to_string(),
            ));
        };

        for _attempt in 0..MAX_WRITE_ATTEMPTS {
            let Some(existing) = self.store.find_by_subscription_ref(subscription_ref).await?
            else {
                warn!(
                    event_id = %event.id,
                    subscription_ref = %subscription_ref,
                    "No record for deleted subscription, acknowledging"
                );
                return Ok(ReconcileWebhookResult::Acknowledged);
            };

            // The notification fires only on the transition out of
            // active, and only from the write that wins the race
            let was_active = existing.status == SubscriptionStatus::Active;
            let expected = existing.updated_at;
            let mut record = existing;
            record.mark_deleted(Timestamp::now());

            match self.store.update(&record, expected).await {
                Ok(()) => {
                    info!(
                        event_id = %event.id,
                        account_id = %record.account_id,
                        subscription_end = ?record.subscription_end,
                        "Subscription deleted, record canceled"
                    );
                    if was_active {
                        send_account_notification(
                            self.directory.as_ref(),
                            self.notifier.as_ref(),
                            record.account_id,
                            NotificationKind::SubscriptionCanceled,
                        )
                        .await;
                    }
                    return Ok(ReconcileWebhookResult::Canceled {
                        account_id: record.account_id,
                    });
                }
                Err(StoreError::WriteConflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::WriteConflict.into())
    }
}
