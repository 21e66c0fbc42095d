//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port for Stripe integration, including:
//! - Checkout sessions (create and retrieve)
//! - Billing portal sessions
//! - Webhook signature verification
//!
//! # Security
//!
//! - Webhook deliveries authenticate via HMAC-SHA256 with constant-time
//!   candidate comparison
//! - Stale delivery timestamps are refused to bound replay
//! - Secrets live in `secrecy::SecretString` wrappers

mod mock_billing_provider;
mod stripe_adapter;
mod webhook_types;

pub use mock_billing_provider::MockBillingProvider;
pub use stripe_adapter::{StripeBillingAdapter, StripeConfig};
pub use webhook_types::{StripeCheckoutSession, StripeSubscription};
