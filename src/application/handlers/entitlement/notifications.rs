//! Best-effort lifecycle notifications.
//!
//! Notifications ride on state transitions that already won their
//! guarded write, so they fire at most once per transition. Delivery is
//! best-effort: a directory miss or send failure is logged and dropped,
//! never bubbled into the reconciliation result.

use tracing::warn;

use crate::domain::foundation::AccountId;
use crate::ports::{AccountDirectory, NotificationKind, NotificationSender};

pub(crate) async fn send_account_notification(
    directory: &dyn AccountDirectory,
    notifier: &dyn NotificationSender,
    account_id: AccountId,
    kind: NotificationKind,
) {
    let email = match directory.find_email(&account_id).await {
        Ok(Some(email)) => email,
        Ok(None) => {
            warn!(account_id = %account_id, ?kind, "No email on file, skipping notification");
            return;
        }
        Err(e) => {
            warn!(account_id = %account_id, ?kind, error = %e, "Account lookup failed, skipping notification");
            return;
        }
    };

    if let Err(e) = notifier.notify(&email, kind).await {
        warn!(account_id = %account_id, ?kind, error = %e, "Notification delivery failed");
    }
}
