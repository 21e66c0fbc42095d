//! GrantTrialHandler - Command handler for issuing one-time trial records.

use std::sync::Arc;

use tracing::info;

use crate::domain::entitlement::{EntitlementError, EntitlementRecord};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::EntitlementStore;

/// Command to grant a trial to an account with no record.
#[derive(Debug, Clone)]
pub struct GrantTrialCommand {
    pub account_id: AccountId,
}

/// Result of a trial grant.
#[derive(Debug, Clone)]
pub struct GrantTrialResult {
    /// The created record.
    pub record: EntitlementRecord,
}

/// Handler for granting trials.
///
/// The insert is a compare-and-insert: an account that already has a
/// record gets `AlreadyExists` back, never a reset trial. Callers treat
/// that as "no-op, read the existing record".
pub struct GrantTrialHandler {
    store: Arc<dyn EntitlementStore>,
}

impl GrantTrialHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, cmd: GrantTrialCommand) -> Result<GrantTrialResult, EntitlementError> {
        // 1. Build the trial record
        let record = EntitlementRecord::start_trial(cmd.account_id, Timestamp::now());

        // 2. Compare-and-insert; AlreadyExists surfaces to the caller
        self.store.insert(&record).await?;

        info!(
            account_id = %record.account_id,
            trial_end = ?record.trial_end,
            "Trial granted"
        );

        Ok(GrantTrialResult { record })
    }
}
