//! Adapters - concrete implementations of the ports.
//!
//! Each submodule binds the core to one external system:
//! - `email` - Notification delivery through Resend
//! - `entitlement` - In-memory entitlement store (testing/development)
//! - `http` - Axum handlers and routes
//! - `postgres` - Database-backed persistence
//! - `stripe` - Billing provider integration

pub mod email;
pub mod entitlement;
pub mod http;
pub mod postgres;
pub mod stripe;
