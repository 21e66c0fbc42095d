//! Account directory port for identity lookups.
//!
//! The entitlement store keys records by account id alone; when the
//! reconciler needs an email address for a notification it asks the
//! identity system through this port. A failed or empty lookup only
//! costs the notification, never the reconciliation write.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::AccountId;

/// Errors from account directory lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The identity system could not be reached or the lookup failed.
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Port for resolving account identity details.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Looks up the email address for an account.
    ///
    /// Returns `None` when the account does not exist or has no email.
    async fn find_email(&self, account_id: &AccountId) -> Result<Option<String>, DirectoryError>;
}
