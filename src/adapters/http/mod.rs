//! HTTP adapters - the axum surface.
//!
//! Routes, handlers, and DTOs for the entitlement and billing API.

pub mod entitlement;

// Re-export key types for convenience
pub use entitlement::entitlement_router;
pub use entitlement::EntitlementAppState;
