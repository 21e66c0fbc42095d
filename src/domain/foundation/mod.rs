//! Foundation - shared value objects.
//!
//! The small vocabulary every entitlement module builds on.

mod ids;
mod timestamp;

pub use ids::AccountId;
pub use timestamp::Timestamp;
