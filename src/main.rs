//! JobSheet Pro entitlement service binary.
//!
//! Wires the PostgreSQL store, Stripe billing adapter, and Resend email
//! sender into the HTTP API, then serves it with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobsheet_pro::adapters::email::{ResendConfig, ResendSender};
use jobsheet_pro::adapters::http::entitlement::{
    entitlement_router, health_check, EntitlementAppState,
};
use jobsheet_pro::adapters::postgres::{PostgresAccountDirectory, PostgresEntitlementStore};
use jobsheet_pro::adapters::stripe::{StripeBillingAdapter, StripeConfig};
use jobsheet_pro::config::{AppConfig, ServerConfig};
use jobsheet_pro::ports::{AccountDirectory, BillingProvider, EntitlementStore, NotificationSender};

fn init_tracing(config: &AppConfig) {
    // RUST_LOG wins over the configured directive when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    if config.server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_cors(server: &ServerConfig) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let origins = server.cors_origins_list();
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]));
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<_, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
            _ = sigint.recv() => info!("SIGINT received, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl-C received, shutting down");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;
    info!(
        environment = ?config.server.environment,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let entitlement_store: Arc<dyn EntitlementStore> =
        Arc::new(PostgresEntitlementStore::new(pool.clone()));
    let account_directory: Arc<dyn AccountDirectory> =
        Arc::new(PostgresAccountDirectory::new(pool.clone()));

    let stripe_config = StripeConfig::new(
        config.payment.stripe_api_key.clone(),
        config.payment.stripe_webhook_secret.clone(),
        config.payment.stripe_price_id.clone(),
    )
    .with_checkout_urls(
        config.payment.checkout_success_url.clone(),
        config.payment.checkout_cancel_url.clone(),
    )
    .with_require_livemode(config.payment.require_livemode);
    let billing_provider: Arc<dyn BillingProvider> =
        Arc::new(StripeBillingAdapter::new(stripe_config));

    if config.email.is_enabled() {
        info!("Email notifications enabled");
    } else {
        info!("Email notifications disabled, no Resend API key configured");
    }
    let resend_config = ResendConfig::new(config.email.resend_api_key.clone())
        .with_from_address(config.email.from_header())
        .with_dashboard_url(config.email.dashboard_url.clone());
    let notification_sender: Arc<dyn NotificationSender> =
        Arc::new(ResendSender::new(resend_config));

    let state = EntitlementAppState {
        entitlement_store,
        billing_provider,
        notification_sender,
        account_directory,
        portal_return_url: config.payment.portal_return_url.clone(),
    };

    let cors = build_cors(&config.server)?;
    let app = Router::new()
        .nest("/api", entitlement_router())
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("JobSheet Pro entitlement service listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}
