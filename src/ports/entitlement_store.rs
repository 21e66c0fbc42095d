//! Entitlement record persistence port.
//!
//! The store is the single synchronization point for every writer: webhook
//! deliveries, the verification endpoint, and the trial grant issuer all
//! converge here. Writes are conditional; there is no pessimistic locking.
//!
//! # Design
//!
//! - **Compare-and-insert**: `insert` fails if the account already has a
//!   record, which is what makes trial grants abuse-proof.
//! - **Compare-and-set**: `update` is keyed on the record's previous
//!   `updated_at`; a concurrent writer surfaces as `WriteConflict` and the
//!   caller retries with a fresh read.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entitlement::{EntitlementError, EntitlementRecord, WebhookError};
use crate::domain::foundation::{AccountId, Timestamp};

/// Errors surfaced by entitlement store implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A record already exists for the account.
    #[error("Entitlement record already exists for account {0}")]
    AlreadyExists(AccountId),

    /// The record changed since it was read; the conditional write did
    /// not apply.
    #[error("Entitlement record was modified concurrently")]
    WriteConflict,

    /// The datastore could not be reached or the operation failed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Port for persisting entitlement records.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// Fails with `AlreadyExists` if the account already has one; callers
    /// treat that as "no-op, read the existing record".
    async fn insert(&self, record: &EntitlementRecord) -> Result<(), StoreError>;

    /// Replaces the stored record, but only if its `updated_at` still
    /// matches `expected_updated_at`.
    async fn update(
        &self,
        record: &EntitlementRecord,
        expected_updated_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Looks up the record for an account.
    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<EntitlementRecord>, StoreError>;

    /// Looks up the record holding the given provider subscription ref.
    ///
    /// Used by the reconciler to route subscription lifecycle events that
    /// carry no account correlation of their own.
    async fn find_by_subscription_ref(
        &self,
        subscription_ref: &str,
    ) -> Result<Option<EntitlementRecord>, StoreError>;
}

impl From<StoreError> for EntitlementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(account_id) => EntitlementError::already_exists(account_id),
            StoreError::WriteConflict => EntitlementError::WriteConflict,
            StoreError::Unavailable(message) => EntitlementError::reconciliation_failed(message),
        }
    }
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        WebhookError::Store(err.to_string())
    }
}
