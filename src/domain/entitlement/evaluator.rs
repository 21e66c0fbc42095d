//! Pure entitlement evaluation.
//!
//! Maps a record (or its absence) plus a caller-supplied instant to an
//! access decision. No I/O and no hidden clock reads: every caller passes
//! `now`, so decisions are reproducible with fixed instants.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::{EntitlementRecord, SubscriptionStatus};

/// Access decision for one account at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    /// Whether gated features may be used right now.
    pub has_access: bool,

    /// Inside a trial window.
    pub is_trial_active: bool,

    /// Inside a paid window backed by a provider subscription.
    pub is_paid_active: bool,

    /// A window existed but has passed.
    pub is_expired: bool,

    /// No record exists for the account. Denies access like `is_expired`
    /// but drives different UI treatment.
    pub no_record: bool,

    /// Trial boundary, echoed for display.
    pub trial_end: Option<Timestamp>,

    /// Paid boundary, echoed for display.
    pub subscription_end: Option<Timestamp>,
}

/// Evaluates an account's entitlement at `now`.
///
/// Access follows the paid-through date: a record the provider marked
/// `canceled` keeps access until `subscription_end` passes. Termination
/// events cap `subscription_end`, so a dead relationship still denies
/// access immediately.
pub fn evaluate(record: Option<&EntitlementRecord>, now: Timestamp) -> Entitlement {
    let Some(record) = record else {
        return Entitlement {
            has_access: false,
            is_trial_active: false,
            is_paid_active: false,
            is_expired: false,
            no_record: true,
            trial_end: None,
            subscription_end: None,
        };
    };

    let in_trial = record.status == SubscriptionStatus::Trial;
    let in_paid = matches!(
        record.status,
        SubscriptionStatus::Active | SubscriptionStatus::Canceled
    );

    let is_trial_active = in_trial
        && record
            .trial_end
            .map_or(false, |end| now.is_before(&end));

    let is_paid_active = in_paid
        && record.billing_subscription_ref.is_some()
        && record
            .subscription_end
            .map_or(false, |end| now.is_before(&end));

    let trial_expired = in_trial
        && record
            .trial_end
            .map_or(false, |end| !now.is_before(&end));
    let paid_expired = in_paid
        && record
            .subscription_end
            .map_or(false, |end| !now.is_before(&end));

    Entitlement {
        has_access: is_trial_active || is_paid_active,
        is_trial_active,
        is_paid_active,
        is_expired: trial_expired || paid_expired,
        no_record: false,
        trial_end: record.trial_end,
        subscription_end: record.subscription_end,
    }
}
