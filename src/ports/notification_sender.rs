//! Notification sender port for transactional email.
//!
//! Fire-and-forget from the reconciler's perspective: a failed delivery is
//! logged and never blocks or fails the reconciliation write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle notifications sent to account holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A paid subscription was activated.
    SubscriptionStarted,

    /// A paid subscription was canceled.
    SubscriptionCanceled,
}

/// Errors from notification delivery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    /// The message could not be delivered.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Port for sending account lifecycle notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends the notification to the given address.
    async fn notify(&self, email: &str, kind: NotificationKind) -> Result<(), NotificationError>;
}
