//! PostgreSQL implementation of EntitlementStore.
//!
//! Provides persistent storage for entitlement records using PostgreSQL.
//! Both conditional writes ride on the database: insert uniqueness comes
//! from the primary key, update atomicity from a guarded `updated_at`
//! predicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entitlement::{EntitlementRecord, SubscriptionStatus};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::{EntitlementStore, StoreError};

/// PostgreSQL implementation of the EntitlementStore port.
///
/// Queries run as sqlx prepared statements on the shared pool.
pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    /// Creates a new PostgresEntitlementStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an entitlement record.
#[derive(Debug, sqlx::FromRow)]
struct EntitlementRow {
    account_id: Uuid,
    status: String,
    trial_end: Option<DateTime<Utc>>,
    subscription_end: Option<DateTime<Utc>>,
    billing_customer_ref: Option<String>,
    billing_subscription_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EntitlementRow> for EntitlementRecord {
    type Error = StoreError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        let status: SubscriptionStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Unavailable(format!("Invalid status value: {}", e)))?;

        Ok(EntitlementRecord {
            account_id: AccountId::from_uuid(row.account_id),
            status,
            trial_end: row.trial_end.map(Timestamp::from_datetime),
            subscription_end: row.subscription_end.map(Timestamp::from_datetime),
            billing_customer_ref: row.billing_customer_ref,
            billing_subscription_ref: row.billing_subscription_ref,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    async fn insert(&self, record: &EntitlementRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO entitlements (
                account_id, status, trial_end, subscription_end,
                billing_customer_ref, billing_subscription_ref, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.account_id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.trial_end.as_ref().map(|t| *t.as_datetime()))
        .bind(record.subscription_end.as_ref().map(|t| *t.as_datetime()))
        .bind(&record.billing_customer_ref)
        .bind(&record.billing_subscription_ref)
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("entitlements_pkey") {
                    return StoreError::AlreadyExists(record.account_id);
                }
            }
            StoreError::Unavailable(format!("Failed to insert entitlement: {}", e))
        })?;

        Ok(())
    }

    async fn update(
        &self,
        record: &EntitlementRecord,
        expected_updated_at: Timestamp,
    ) -> Result<(), StoreError> {
        // The updated_at predicate makes this a compare-and-set: zero rows
        // affected means a concurrent writer got there first
        let result = sqlx::query(
            r#"
            UPDATE entitlements SET
                status = $2,
                trial_end = $3,
                subscription_end = $4,
                billing_customer_ref = $5,
                billing_subscription_ref = $6,
                updated_at = $7
            WHERE account_id = $1 AND updated_at = $8
            "#,
        )
        .bind(record.account_id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.trial_end.as_ref().map(|t| *t.as_datetime()))
        .bind(record.subscription_end.as_ref().map(|t| *t.as_datetime()))
        .bind(&record.billing_customer_ref)
        .bind(&record.billing_subscription_ref)
        .bind(record.updated_at.as_datetime())
        .bind(expected_updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Failed to update entitlement: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::WriteConflict);
        }

        Ok(())
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<EntitlementRecord>, StoreError> {
        let row: Option<EntitlementRow> = sqlx::query_as(
            r#"
            SELECT account_id, status, trial_end, subscription_end,
                   billing_customer_ref, billing_subscription_ref, created_at, updated_at
            FROM entitlements
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Failed to find entitlement: {}", e)))?;

        row.map(EntitlementRecord::try_from).transpose()
    }

    async fn find_by_subscription_ref(
        &self,
        subscription_ref: &str,
    ) -> Result<Option<EntitlementRecord>, StoreError> {
        let row: Option<EntitlementRow> = sqlx::query_as(
            r#"
            SELECT account_id, status, trial_end, subscription_end,
                   billing_customer_ref, billing_subscription_ref, created_at, updated_at
            FROM entitlements
            WHERE billing_subscription_ref = $1
            "#,
        )
        .bind(subscription_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Failed to find entitlement: {}", e)))?;

        row.map(EntitlementRecord::try_from).transpose()
    }
}
