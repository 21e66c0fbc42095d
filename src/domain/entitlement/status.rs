//! Subscription status vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status of an account's subscription record.
///
/// Closed set; transitions happen only through [`EntitlementRecord`]
/// mutators, never by assigning a free-form string.
///
/// Status records the billing provider's intent. Whether the account
/// currently has access is decided by the evaluator against `trial_end` /
/// `subscription_end`, so `Canceled` does not by itself revoke a paid
/// period that is still running.
///
/// [`EntitlementRecord`]: super::EntitlementRecord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Time-boxed trial, no billing relationship.
    Trial,

    /// Paid subscription in good standing.
    Active,

    /// Provider reported the subscription as no longer in good standing.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns the wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for a status string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown subscription status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for SubscriptionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(SubscriptionStatus::Trial),
            "active" => Ok(SubscriptionStatus::Active),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
