//! Stripe wire types.
//!
//! Deserialization structs for the Stripe API objects this adapter reads:
//! checkout sessions (API responses and webhook payloads) and subscriptions
//! (webhook payloads). Only fields we interpret are declared; serde skips
//! the rest of Stripe's payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stripe checkout session object.
///
/// Appears in create/retrieve API responses and inside
/// `checkout.session.completed` webhook payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID (cs_xxx format).
    pub id: String,

    /// Customer ID, present once Stripe has created or matched a customer.
    pub customer: Option<String>,

    /// Email used for the checkout.
    pub customer_email: Option<String>,

    /// Subscription ID; absent until subscription-mode payment completes.
    pub subscription: Option<String>,

    /// Payment status: "paid", "unpaid", or "no_payment_required".
    pub payment_status: String,

    /// Session status: "open", "complete", or "expired".
    pub status: String,

    /// Metadata attached at session creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Session mode: "payment", "setup", or "subscription".
    pub mode: String,

    /// Hosted checkout URL; populated on creation, null once the
    /// session completes.
    pub url: Option<String>,
}

impl StripeCheckoutSession {
    /// Extract the account correlation metadata, if the session carries it.
    pub fn account_metadata(&self) -> Option<String> {
        self.metadata.get("account_id").cloned()
    }
}

/// Stripe subscription object (trimmed to reconciliation needs).
///
/// Appears inside `customer.subscription.*` webhook payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeSubscription {
    /// Subscription ID (sub_xxx format).
    pub id: String,

    /// Customer this subscription belongs to.
    pub customer: Option<String>,

    /// Subscription status string ("active", "past_due", "canceled", ...).
    pub status: String,

    /// End of the current billing period (Unix timestamp).
    pub current_period_end: Option<i64>,

    /// Whether the subscription cancels at the period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// When the subscription was canceled, if it was.
    pub canceled_at: Option<i64>,
}
