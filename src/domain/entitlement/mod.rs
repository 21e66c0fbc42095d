//! Entitlement domain module.
//!
//! Handles the subscription entitlement lifecycle: trial grants, paid
//! activation, provider-driven status reconciliation, and access evaluation.
//!
//! # Module Structure
//!
//! - `record` - EntitlementRecord aggregate entity
//! - `status` - SubscriptionStatus provider-intent states
//! - `evaluator` - Pure entitlement evaluation from record state
//! - `errors` - EntitlementError taxonomy
//! - `stripe_event` - Webhook event envelope
//! - `webhook_verifier` - HMAC-SHA256 signature verification
//! - `webhook_errors` - Webhook processing error taxonomy

mod errors;
mod evaluator;
mod record;
mod status;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use errors::EntitlementError;
pub use evaluator::{evaluate, Entitlement};
pub use record::{EntitlementRecord, PAID_PERIOD_MONTHS, TRIAL_PERIOD_HOURS};
pub use status::{SubscriptionStatus, UnknownStatus};
pub use stripe_event::{StripeEvent, StripeEventData};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
