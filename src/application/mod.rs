//! Application layer - use-case handlers.
//!
//! Handlers wire domain operations to the ports they depend on. Writes go
//! through command handlers, reads through query handlers.

pub mod handlers;

pub use handlers::entitlement::{
    // Commands
    GrantTrialCommand, GrantTrialHandler, GrantTrialResult,
    OpenPortalCommand, OpenPortalHandler, OpenPortalResult,
    ReconcileWebhookCommand, ReconcileWebhookHandler, ReconcileWebhookResult,
    StartCheckoutCommand, StartCheckoutHandler, StartCheckoutResult,
    VerificationStatus, VerifySubscriptionCommand, VerifySubscriptionHandler,
    VerifySubscriptionResult,
    // Queries
    CheckEntitlementHandler, CheckEntitlementQuery,
};
