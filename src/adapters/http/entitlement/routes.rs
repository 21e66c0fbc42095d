//! Axum router configuration for entitlement and billing endpoints.
//!
//! This module defines the route structure for the entitlement API
//! and wires each route to its corresponding handler.

use axum::{
    routing::{get, post},
    Json, Router,
};

use super::handlers::{
    create_checkout, get_entitlement, handle_billing_webhook, open_portal, start_trial,
    verify_subscription, EntitlementAppState,
};

/// Create the entitlement API router.
///
/// # Routes
/// - `POST /trial` - Grant a one-time trial
/// - `GET /:account_id` - Evaluate an account's entitlement
pub fn entitlement_routes() -> Router<EntitlementAppState> {
    Router::new()
        .route("/trial", post(start_trial))
        .route("/:account_id", get(get_entitlement))
}

/// Create the billing API router.
///
/// # Routes
/// - `POST /checkout` - Start hosted checkout
/// - `POST /verify` - Verify a checkout session after the redirect
/// - `POST /portal` - Open the billing self-service portal
pub fn billing_routes() -> Router<EntitlementAppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/verify", post(verify_subscription))
        .route("/portal", post(open_portal))
}

/// Create the billing webhook router.
///
/// Separate from the API routes because webhook deliveries carry no
/// caller identity; they authenticate via payload signature instead.
///
/// # Routes
/// - `POST /billing` - Reconcile billing provider webhooks
pub fn webhook_routes() -> Router<EntitlementAppState> {
    Router::new().route("/billing", post(handle_billing_webhook))
}

/// Create the complete entitlement module router.
///
/// Combines entitlement, billing and webhook routes into a single router
/// suitable for mounting at `/api`.
pub fn entitlement_router() -> Router<EntitlementAppState> {
    Router::new()
        .nest("/entitlement", entitlement_routes())
        .nest("/billing", billing_routes())
        .nest("/webhooks", webhook_routes())
}

/// GET /health - Liveness probe.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
