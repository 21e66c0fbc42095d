//! PostgreSQL implementation of AccountDirectory.
//!
//! Looks up contact email addresses in the accounts table, which is owned
//! by the identity service. This adapter only reads from it.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::AccountId;
use crate::ports::{AccountDirectory, DirectoryError};

/// PostgreSQL implementation of the AccountDirectory port.
pub struct PostgresAccountDirectory {
    pool: PgPool,
}

impl PostgresAccountDirectory {
    /// Creates a new PostgresAccountDirectory with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PostgresAccountDirectory {
    async fn find_email(&self, account_id: &AccountId) -> Result<Option<String>, DirectoryError> {
        let email: Option<String> = sqlx::query_scalar::<_, String>(
            r#"
            SELECT email
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirectoryError::Unavailable(format!("Failed to look up email: {}", e)))?;

        Ok(email)
    }
}
