//! Application handlers.
//!
//! Command and query handlers, one module per domain area.

pub mod entitlement;
