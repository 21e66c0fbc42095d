//! CheckEntitlementHandler - Query handler for evaluating account access.

use std::sync::Arc;

use crate::domain::entitlement::{evaluate, Entitlement, EntitlementError};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::EntitlementStore;

/// Query for an account's current entitlement.
#[derive(Debug, Clone)]
pub struct CheckEntitlementQuery {
    pub account_id: AccountId,
}

/// Handler for entitlement checks.
///
/// Read-only: loads the record (if any) and evaluates it against the
/// clock. An account with no record evaluates to no access rather than
/// an error, so gating callers never have to special-case new accounts.
pub struct CheckEntitlementHandler {
    store: Arc<dyn EntitlementStore>,
}

impl CheckEntitlementHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: CheckEntitlementQuery) -> Result<Entitlement, EntitlementError> {
        // 1. Load the record, absent records are a valid answer
        let record = self.store.find_by_account(&query.account_id).await?;

        // 2. Evaluate against the current clock
        Ok(evaluate(record.as_ref(), Timestamp::now()))
    }
}
