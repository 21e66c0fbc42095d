//! PostgreSQL persistence adapters.
//!
//! sqlx-backed implementations of the storage ports:
//! - `PostgresEntitlementStore` - Entitlement records with conditional writes
//! - `PostgresAccountDirectory` - Read-only email lookups against accounts

mod account_directory;
mod entitlement_store;

pub use account_directory::PostgresAccountDirectory;
pub use entitlement_store::PostgresEntitlementStore;
