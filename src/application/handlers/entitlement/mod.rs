//! Entitlement handlers.
//!
//! Command and query handlers for the subscription lifecycle including:
//!
//! ## Commands
//! - Granting one-time trials
//! - Starting hosted checkout
//! - Verifying checkout sessions after the redirect
//! - Opening the billing self-service portal
//! - Reconciling billing provider webhooks
//!
//! ## Queries
//! - Evaluating an account's current entitlement

mod activation;
mod check_entitlement;
mod grant_trial;
mod notifications;
mod open_portal;
mod reconcile_webhook;
mod start_checkout;
mod verify_subscription;

// Commands
pub use grant_trial::{GrantTrialCommand, GrantTrialHandler, GrantTrialResult};
pub use open_portal::{OpenPortalCommand, OpenPortalHandler, OpenPortalResult};
pub use reconcile_webhook::{
    ReconcileWebhookCommand, ReconcileWebhookHandler, ReconcileWebhookResult,
};
pub use start_checkout::{StartCheckoutCommand, StartCheckoutHandler, StartCheckoutResult};
pub use verify_subscription::{
    VerificationStatus, VerifySubscriptionCommand, VerifySubscriptionHandler,
    VerifySubscriptionResult,
};

// Queries
pub use check_entitlement::{CheckEntitlementHandler, CheckEntitlementQuery};
