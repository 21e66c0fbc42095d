//! Entitlement Store Adapters
//!
//! Implementations of the EntitlementStore port beyond PostgreSQL.
//!
//! ## Available Adapters
//!
//! - **InMemoryEntitlementStore** - Stores records in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::entitlement::InMemoryEntitlementStore;
//!
//! let store = InMemoryEntitlementStore::new();
//! ```

mod in_memory_store;

pub use in_memory_store::InMemoryEntitlementStore;
