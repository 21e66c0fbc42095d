//! Entitlement record aggregate.
//!
//! One record per account, the single source of truth for subscription
//! state. Created by the trial grant or by checkout activation; mutated only
//! by the reconciliation and verification flows.
//!
//! # Invariants
//!
//! - `account_id` is unique (compare-and-insert at the store level)
//! - `status = Trial` implies `billing_subscription_ref` is `None`
//! - `status = Active` implies `billing_subscription_ref` is `Some`
//! - `billing_customer_ref`, once set, is never cleared
//! - `updated_at` never moves backwards
//!
//! Every mutator takes `now` from the caller; the aggregate never reads the
//! clock itself.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, Timestamp};

use super::SubscriptionStatus;

/// Length of the free trial granted to new accounts.
pub const TRIAL_PERIOD_HOURS: i64 = 72;

/// Paid window opened by a completed checkout, advanced on renewal.
pub const PAID_PERIOD_MONTHS: i64 = 1;

/// Per-account subscription state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// Account this record belongs to. Immutable.
    pub account_id: AccountId,

    /// Billing-provider intent; access is decided by the evaluator.
    pub status: SubscriptionStatus,

    /// End of the trial window. Set only while `status = Trial`.
    pub trial_end: Option<Timestamp>,

    /// Paid-period boundary. Set and advanced only by reconciliation
    /// and verification, never by client input.
    pub subscription_end: Option<Timestamp>,

    /// Opaque provider customer identifier. Once set, never cleared.
    pub billing_customer_ref: Option<String>,

    /// Opaque provider subscription identifier for the paid relationship.
    pub billing_subscription_ref: Option<String>,

    /// When the record was created.
    pub created_at: Timestamp,

    /// When the record was last written. Monotonic.
    pub updated_at: Timestamp,
}

impl EntitlementRecord {
    /// Creates a fresh trial record: 72 hours of access, no billing fields.
    pub fn start_trial(account_id: AccountId, now: Timestamp) -> Self {
        Self {
            account_id,
            status: SubscriptionStatus::Trial,
            trial_end: Some(now.add_hours(TRIAL_PERIOD_HOURS)),
            subscription_end: None,
            billing_customer_ref: None,
            billing_subscription_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an already-active record for an account with no prior record.
    ///
    /// Used by the activation path when a checkout completes before any
    /// trial was granted.
    pub fn activated(
        account_id: AccountId,
        customer_ref: Option<String>,
        subscription_ref: String,
        now: Timestamp,
    ) -> Self {
        Self {
            account_id,
            status: SubscriptionStatus::Active,
            trial_end: None,
            subscription_end: Some(now.add_months(PAID_PERIOD_MONTHS)),
            billing_customer_ref: customer_ref,
            billing_subscription_ref: Some(subscription_ref),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a completed checkout to this record.
    ///
    /// Sets the paid relationship refs, opens a one-month paid window and
    /// clears the trial fields. A `None` customer ref merges with (rather
    /// than clobbers) a ref a racing writer may already have stored.
    pub fn activate(
        &mut self,
        customer_ref: Option<String>,
        subscription_ref: String,
        now: Timestamp,
    ) {
        self.status = SubscriptionStatus::Active;
        self.trial_end = None;
        self.subscription_end = Some(now.add_months(PAID_PERIOD_MONTHS));
        if customer_ref.is_some() {
            self.billing_customer_ref = customer_ref;
        }
        self.billing_subscription_ref = Some(subscription_ref);
        self.touch(now);
    }

    /// Records the provider's view of the subscription status.
    ///
    /// The paid window is left untouched: a subscription the provider marks
    /// as no longer in good standing keeps access through the date already
    /// paid for. Callers locate the record by `billing_subscription_ref`,
    /// so this is never applied to a trial.
    pub fn apply_provider_status(&mut self, status: SubscriptionStatus, now: Timestamp) {
        self.status = status;
        self.touch(now);
    }

    /// Records termination of the paid relationship by the provider.
    ///
    /// Unlike [`apply_provider_status`], this also caps the paid window:
    /// a deleted subscription has actually ended, so access stops now
    /// rather than at the previously projected boundary.
    ///
    /// [`apply_provider_status`]: Self::apply_provider_status
    pub fn mark_deleted(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Canceled;
        match self.subscription_end {
            Some(end) if !end.is_after(&now) => {}
            _ => self.subscription_end = Some(now),
        }
        self.touch(now);
    }

    /// Returns true if a provider customer ref exists (portal precondition).
    pub fn has_billing_relationship(&self) -> bool {
        self.billing_customer_ref.is_some()
    }

    /// Advances `updated_at` without ever moving it backwards.
    fn touch(&mut self, now: Timestamp) {
        self.updated_at = self.updated_at.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> AccountId {
        AccountId::new()
    }

    fn at(secs: u64) -> Timestamp {
        Timestamp::from_unix_secs(secs)
    }

    #[test]
    fn start_trial_sets_seventy_two_hour_window() {
        let now = at(1_000_000);
        let record = EntitlementRecord::start_trial(account(), now);

        assert_eq!(record.status, SubscriptionStatus::Trial);
        assert_eq!(record.trial_end, Some(now.add_hours(72)));
        assert!(record.subscription_end.is_none());
        assert!(record.billing_customer_ref.is_none());
        assert!(record.billing_subscription_ref.is_none());
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn activate_from_trial_clears_trial_and_opens_paid_window() {
        let now = at(1_000_000);
        let mut record = EntitlementRecord::start_trial(account(), now);
        let later = at(1_100_000);

        record.activate(Some("cus_123".into()), "sub_123".into(), later);

        assert_eq!(record.status, SubscriptionStatus::Active);
        assert!(record.trial_end.is_none());
        assert_eq!(record.subscription_end, Some(later.add_months(1)));
        assert_eq!(record.billing_customer_ref.as_deref(), Some("cus_123"));
        assert_eq!(record.billing_subscription_ref.as_deref(), Some("sub_123"));
        assert_eq!(record.updated_at, later);
    }

    #[test]
    fn activate_without_customer_ref_keeps_existing_ref() {
        let now = at(1_000_000);
        let mut record =
            EntitlementRecord::activated(account(), Some("cus_orig".into()), "sub_1".into(), now);

        record.activate(None, "sub_1".into(), at(1_000_100));

        assert_eq!(record.billing_customer_ref.as_deref(), Some("cus_orig"));
    }

    #[test]
    fn activated_constructor_produces_consistent_record() {
        let now = at(1_000_000);
        let record =
            EntitlementRecord::activated(account(), Some("cus_9".into()), "sub_9".into(), now);

        assert_eq!(record.status, SubscriptionStatus::Active);
        assert!(record.trial_end.is_none());
        assert_eq!(record.subscription_end, Some(now.add_months(1)));
        assert_eq!(record.billing_subscription_ref.as_deref(), Some("sub_9"));
    }

    #[test]
    fn apply_provider_status_keeps_paid_window() {
        let now = at(1_000_000);
        let mut record =
            EntitlementRecord::activated(account(), Some("cus_2".into()), "sub_2".into(), now);
        let paid_through = record.subscription_end;

        record.apply_provider_status(SubscriptionStatus::Canceled, at(1_000_500));

        assert_eq!(record.status, SubscriptionStatus::Canceled);
        assert_eq!(record.subscription_end, paid_through);
    }

    #[test]
    fn mark_deleted_caps_future_paid_window() {
        let now = at(1_000_000);
        let mut record =
            EntitlementRecord::activated(account(), Some("cus_3".into()), "sub_3".into(), now);
        let deleted_at = at(1_050_000);

        record.mark_deleted(deleted_at);

        assert_eq!(record.status, SubscriptionStatus::Canceled);
        assert_eq!(record.subscription_end, Some(deleted_at));
    }

    #[test]
    fn mark_deleted_leaves_already_passed_window() {
        let now = at(1_000_000);
        let mut record =
            EntitlementRecord::activated(account(), None, "sub_4".into(), now);
        let past_end = at(1_000_010);
        record.subscription_end = Some(past_end);

        record.mark_deleted(at(2_000_000));

        assert_eq!(record.subscription_end, Some(past_end));
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        let now = at(1_000_000);
        let mut record = EntitlementRecord::start_trial(account(), now);

        // Clock skew: a writer observing an earlier wall clock.
        record.activate(None, "sub_5".into(), at(999_000));

        assert_eq!(record.updated_at, now);
        assert_eq!(record.status, SubscriptionStatus::Active);
    }

    #[test]
    fn has_billing_relationship_follows_customer_ref() {
        let now = at(1_000_000);
        let mut record = EntitlementRecord::start_trial(account(), now);
        assert!(!record.has_billing_relationship());

        record.activate(Some("cus_6".into()), "sub_6".into(), now);
        assert!(record.has_billing_relationship());
    }
}
