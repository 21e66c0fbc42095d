//! Shared checkout-activation logic for webhook and verify paths.
//!
//! The webhook and the post-redirect verify race to record the same
//! payment. Both funnel through [`apply_checkout_activation`], which
//! reads the current record and applies the activation with a guarded
//! write, so whichever path lands second sees the first one's work and
//! becomes a no-op.

use tracing::debug;

use crate::domain::entitlement::{EntitlementRecord, SubscriptionStatus};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::{EntitlementStore, StoreError};

/// Guarded writes re-read and retry this many times before giving up.
pub(crate) const MAX_WRITE_ATTEMPTS: u32 = 3;

/// What a checkout activation did to the record.
#[derive(Debug, Clone)]
pub(crate) enum ActivationOutcome {
    /// This call transitioned the record to active. The caller owns the
    /// one-time side effects (the welcome notification).
    Activated(EntitlementRecord),

    /// The record was already active under the same subscription ref.
    /// A redelivered event or the second arm of the webhook/verify race.
    AlreadyActive(EntitlementRecord),

    /// The record holds the same subscription ref but is no longer
    /// active. A late redelivery must not resurrect a canceled
    /// subscription.
    Stale,
}

/// Apply a confirmed checkout to the account's record.
///
/// Creates the record when none exists, otherwise transitions the
/// existing one. Updates are compare-and-swap on `updated_at`; a lost
/// race triggers a fresh read so the same-ref checks above run against
/// current state. Exhausting the attempts surfaces as `WriteConflict`.
pub(crate) async fn apply_checkout_activation(
    store: &dyn EntitlementStore,
    account_id: AccountId,
    customer_ref: Option<String>,
    subscription_ref: &str,
) -> Result<ActivationOutcome, StoreError> {
    for attempt in 0..MAX_WRITE_ATTEMPTS {
        match store.find_by_account(&account_id).await? {
            None => {
                let record = EntitlementRecord::activated(
                    account_id,
                    customer_ref.clone(),
                    subscription_ref.to_string(),
                    Timestamp::now(),
                );
                match store.insert(&record).await {
                    Ok(()) => return Ok(ActivationOutcome::Activated(record)),
                    // Another writer created the record between our read
                    // and insert; re-read and reconcile against it
                    Err(StoreError::AlreadyExists(_)) => {
                        debug!(account_id = %account_id, attempt, "Insert raced, re-reading");
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(existing) => {
                if existing.billing_subscription_ref.as_deref() == Some(subscription_ref) {
                    return match existing.status {
                        SubscriptionStatus::Active => {
                            Ok(ActivationOutcome::AlreadyActive(existing))
                        }
                        _ => Ok(ActivationOutcome::Stale),
                    };
                }

                let expected = existing.updated_at;
                let mut record = existing;
                record.activate(
                    customer_ref.clone(),
                    subscription_ref.to_string(),
                    Timestamp::now(),
                );
                match store.update(&record, expected).await {
                    Ok(()) => return Ok(ActivationOutcome::Activated(record)),
                    Err(StoreError::WriteConflict) => {
                        debug!(account_id = %account_id, attempt, "Update raced, re-reading");
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Err(StoreError::WriteConflict)
}
