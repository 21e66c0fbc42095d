//! Domain layer: pure business rules, no I/O.
//!
//! - `foundation` - Shared domain primitives (value objects, IDs)
//! - `entitlement` - Subscription entitlement records, evaluation, and
//!   webhook verification

pub mod entitlement;
pub mod foundation;
