//! In-Memory Entitlement Store Adapter
//!
//! Stores entitlement records in memory with the same conditional-write
//! semantics as the PostgreSQL store. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entitlement::EntitlementRecord;
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::{EntitlementStore, StoreError};

/// In-memory storage for entitlement records
#[derive(Debug, Clone)]
pub struct InMemoryEntitlementStore {
    records: Arc<RwLock<HashMap<AccountId, EntitlementRecord>>>,
}

impl InMemoryEntitlementStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all stored records (useful for tests)
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Get the number of stored records
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryEntitlementStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn insert(&self, record: &EntitlementRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.account_id) {
            return Err(StoreError::AlreadyExists(record.account_id));
        }
        records.insert(record.account_id, record.clone());
        Ok(())
    }

    async fn update(
        &self,
        record: &EntitlementRecord,
        expected_updated_at: Timestamp,
    ) -> Result<(), StoreError> {
        // Check and replace under one write guard so concurrent updates
        // against the same expected timestamp produce exactly one winner
        let mut records = self.records.write().await;
        match records.get(&record.account_id) {
            Some(current) if current.updated_at == expected_updated_at => {
                records.insert(record.account_id, record.clone());
                Ok(())
            }
            _ => Err(StoreError::WriteConflict),
        }
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<EntitlementRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(account_id).cloned())
    }

    async fn find_by_subscription_ref(
        &self,
        subscription_ref: &str,
    ) -> Result<Option<EntitlementRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.billing_subscription_ref.as_deref() == Some(subscription_ref))
            .cloned())
    }
}
