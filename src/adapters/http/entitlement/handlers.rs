//! HTTP handlers for entitlement and billing endpoints.
//!
//! Axum handlers that translate requests into application commands and
//! queries, then map the results onto status codes and response DTOs.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::entitlement::{
    CheckEntitlementHandler, CheckEntitlementQuery, GrantTrialCommand, GrantTrialHandler,
    OpenPortalCommand, OpenPortalHandler, ReconcileWebhookCommand, ReconcileWebhookHandler,
    StartCheckoutCommand, StartCheckoutHandler, VerifySubscriptionCommand,
    VerifySubscriptionHandler,
};
use crate::domain::entitlement::{EntitlementError, WebhookError};
use crate::domain::foundation::AccountId;
use crate::ports::{AccountDirectory, BillingProvider, EntitlementStore, NotificationSender};

use super::dto::{
    CheckoutRequest, CheckoutResponse, EntitlementResponse, ErrorResponse, PortalRequest,
    PortalResponse, RecordSummaryResponse, StartTrialRequest, VerifyRequest, VerifyResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Dependencies every request handler can reach.
///
/// Cloned per request; the `Arc`-wrapped ports make that cheap
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct EntitlementAppState {
    pub entitlement_store: Arc<dyn EntitlementStore>,
    pub billing_provider: Arc<dyn BillingProvider>,
    pub notification_sender: Arc<dyn NotificationSender>,
    pub account_directory: Arc<dyn AccountDirectory>,
    /// Where the billing portal sends the customer back to.
    pub portal_return_url: String,
}

impl EntitlementAppState {
    /// Builds the handler a route needs from the shared ports.
    pub fn grant_trial_handler(&self) -> GrantTrialHandler {
        GrantTrialHandler::new(self.entitlement_store.clone())
    }

    pub fn check_entitlement_handler(&self) -> CheckEntitlementHandler {
        CheckEntitlementHandler::new(self.entitlement_store.clone())
    }

    pub fn start_checkout_handler(&self) -> StartCheckoutHandler {
        StartCheckoutHandler::new(self.billing_provider.clone())
    }

    pub fn verify_subscription_handler(&self) -> VerifySubscriptionHandler {
        VerifySubscriptionHandler::new(
            self.entitlement_store.clone(),
            self.billing_provider.clone(),
            self.notification_sender.clone(),
            self.account_directory.clone(),
        )
    }

    pub fn open_portal_handler(&self) -> OpenPortalHandler {
        OpenPortalHandler::new(self.billing_provider.clone(), self.portal_return_url.clone())
    }

    pub fn reconcile_webhook_handler(&self) -> ReconcileWebhookHandler {
        ReconcileWebhookHandler::new(
            self.entitlement_store.clone(),
            self.billing_provider.clone(),
            self.notification_sender.clone(),
            self.account_directory.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/entitlement/:account_id - Evaluate an account's entitlement
pub async fn get_entitlement(
    State(state): State<EntitlementAppState>,
    Path(account_id): Path<AccountId>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let handler = state.check_entitlement_handler();
    let query = CheckEntitlementQuery { account_id };

    let entitlement = handler.handle(query).await?;

    Ok(Json(EntitlementResponse::from(entitlement)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/entitlement/trial - Grant a one-time trial
pub async fn start_trial(
    State(state): State<EntitlementAppState>,
    Json(request): Json<StartTrialRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let handler = state.grant_trial_handler();
    let cmd = GrantTrialCommand {
        account_id: request.account_id,
    };

    let result = handler.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordSummaryResponse::from(result.record)),
    ))
}

/// POST /api/billing/checkout - Start hosted checkout
pub async fn create_checkout(
    State(state): State<EntitlementAppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let handler = state.start_checkout_handler();
    let cmd = StartCheckoutCommand {
        account_id: request.account_id,
        email: request.account_email,
    };

    let result = handler.handle(cmd).await?;

    let response = CheckoutResponse {
        session_id: result.session.id,
        redirect_url: result.session.url,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/billing/verify - Verify a checkout session after the redirect
pub async fn verify_subscription(
    State(state): State<EntitlementAppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let handler = state.verify_subscription_handler();
    let cmd = VerifySubscriptionCommand {
        account_id: request.account_id,
        session_id: request.session_id,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(VerifyResponse::from(result.status)))
}

/// POST /api/billing/portal - Open the billing self-service portal
pub async fn open_portal(
    State(state): State<EntitlementAppState>,
    Json(request): Json<PortalRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let handler = state.open_portal_handler();
    let cmd = OpenPortalCommand {
        billing_customer_ref: request.billing_customer_ref,
    };

    let result = handler.handle(cmd).await?;

    let response = PortalResponse {
        redirect_url: result.session.url,
    };

    Ok(Json(response))
}

/// POST /api/webhooks/billing - Reconcile billing provider webhooks
pub async fn handle_billing_webhook(
    State(state): State<EntitlementAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    // An absent header fails signature parsing downstream, same as a
    // garbled one
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let handler = state.reconcile_webhook_handler();
    let cmd = ReconcileWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match handler.handle(cmd).await {
        Ok(_) => Ok(Json(serde_json::json!({ "received": true }))),
        Err(e) => {
            tracing::warn!(error = %e, status = %e.status_code(), "Webhook not processed");
            Err(WebhookApiError(e))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts entitlement errors to HTTP responses.
#[derive(Debug)]
pub struct EntitlementApiError(EntitlementError);

impl From<EntitlementError> for EntitlementApiError {
    fn from(err: EntitlementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for EntitlementApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            EntitlementError::AlreadyExists(_) => StatusCode::CONFLICT,
            EntitlementError::NoBillingRelationship => StatusCode::BAD_REQUEST,
            EntitlementError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            EntitlementError::CheckoutFailed { .. } => StatusCode::BAD_GATEWAY,
            EntitlementError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            EntitlementError::WriteConflict => StatusCode::CONFLICT,
            EntitlementError::ReconciliationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse::new(self.0.code(), self.0.message());
        (status, Json(body)).into_response()
    }
}

/// API error type for webhook deliveries.
///
/// Authentic-but-unusable events answer 2xx so the provider stops
/// redelivering; only signature failures and store errors push back.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        if status.is_success() {
            (status, Json(serde_json::json!({ "received": true }))).into_response()
        } else {
            let body = ErrorResponse::new("WEBHOOK_REJECTED", self.0.to_string());
            (status, Json(body)).into_response()
        }
    }
}
