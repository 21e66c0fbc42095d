//! Entitlement HTTP adapter - REST API for entitlement and billing.
//!
//! Provides endpoints for:
//! - Granting trials and evaluating entitlement
//! - Starting hosted checkout and verifying completed sessions
//! - Opening the billing self-service portal
//! - Reconciling billing provider webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

// Export DTOs for external use
pub use dto::*;

// Export handlers state and router
pub use handlers::EntitlementAppState;
pub use routes::{entitlement_router, health_check};
