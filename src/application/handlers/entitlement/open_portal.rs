//! OpenPortalHandler - Command handler for opening the billing self-service portal.

use std::sync::Arc;

use tracing::info;

use crate::domain::entitlement::EntitlementError;
use crate::ports::{BillingProvider, PortalSession};

/// Command to open a billing portal session.
///
/// Carries the raw customer ref from the caller. Accounts that never
/// completed checkout have no ref and cannot open the portal.
#[derive(Debug, Clone)]
pub struct OpenPortalCommand {
    pub billing_customer_ref: Option<String>,
}

/// Result of a portal session creation.
#[derive(Debug, Clone)]
pub struct OpenPortalResult {
    pub session: PortalSession,
}

/// Handler for opening the provider-hosted billing portal.
pub struct OpenPortalHandler {
    provider: Arc<dyn BillingProvider>,
    return_url: String,
}

impl OpenPortalHandler {
    pub fn new(provider: Arc<dyn BillingProvider>, return_url: String) -> Self {
        Self {
            provider,
            return_url,
        }
    }

    pub async fn handle(&self, cmd: OpenPortalCommand) -> Result<OpenPortalResult, EntitlementError> {
        // 1. A customer ref is required; trial-only accounts have none
        let customer_ref = match cmd.billing_customer_ref.as_deref() {
            Some(r) if !r.trim().is_empty() => r,
            _ => return Err(EntitlementError::no_billing_relationship()),
        };

        // 2. Create the portal session
        let session = self
            .provider
            .create_portal_session(customer_ref, &self.return_url)
            .await
            .map_err(|e| EntitlementError::provider_unavailable(e.to_string()))?;

        info!(session_id = %session.id, "Billing portal session created");

        Ok(OpenPortalResult { session })
    }
}
