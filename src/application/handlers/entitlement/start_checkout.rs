//! StartCheckoutHandler - Command handler for initiating subscription checkout.

use std::sync::Arc;

use tracing::info;

use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::AccountId;
use crate::ports::{BillingProvider, CheckoutSession, CreateCheckoutRequest};

/// Command to start a hosted checkout for an account.
#[derive(Debug, Clone)]
pub struct StartCheckoutCommand {
    pub account_id: AccountId,
    pub email: String,
}

/// Result of a checkout initiation.
#[derive(Debug, Clone)]
pub struct StartCheckoutResult {
    pub session: CheckoutSession,
}

/// Handler for starting checkout.
///
/// No entitlement record is written here. The session carries the
/// account id as provider metadata, and the record changes only when
/// the webhook or the post-redirect verify confirms payment. Abandoned
/// checkouts therefore leave no state behind.
pub struct StartCheckoutHandler {
    provider: Arc<dyn BillingProvider>,
}

impl StartCheckoutHandler {
    pub fn new(provider: Arc<dyn BillingProvider>) -> Self {
        Self { provider }
    }

    pub async fn handle(
        &self,
        cmd: StartCheckoutCommand,
    ) -> Result<StartCheckoutResult, EntitlementError> {
        // 1. Create the provider session, tagged with the account id
        let session = self
            .provider
            .create_checkout_session(CreateCheckoutRequest {
                account_id: cmd.account_id,
                email: cmd.email,
            })
            .await
            .map_err(|e| {
                if e.is_retryable() {
                    EntitlementError::provider_unavailable(e.to_string())
                } else {
                    EntitlementError::checkout_failed(e.to_string())
                }
            })?;

        info!(
            account_id = %cmd.account_id,
            session_id = %session.id,
            "Checkout session created"
        );

        Ok(StartCheckoutResult { session })
    }
}
