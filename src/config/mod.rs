//! Application configuration
//!
//! Environment-driven typed configuration built on the `config` and
//! `dotenvy` crates. Variables carry the `JOBSHEET_PRO` prefix with `__`
//! separating nested keys.
//!
//! # Example
//!
//! ```no_run
//! use jobsheet_pro::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load config");
//! config.validate().expect("Config validation failed");
//!
//! let addr = config.server.bind_addr().expect("Invalid bind address");
//! println!("Server running on {addr}");
//! ```

mod database;
mod email;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the JobSheet Pro entitlement
/// service. Load using [`AppConfig::load()`] which reads from environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings (bind address, environment, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection settings
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,

    /// Email configuration (Resend)
    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Loads configuration from the environment
    ///
    /// This function:
    /// 1. Reads a `.env` file when present (development convenience)
    /// 2. Collects environment variables under the `JOBSHEET_PRO` prefix
    /// 3. Splits nested keys on `__` (double underscore)
    /// 4. Deserializes the result into the typed sections
    ///
    /// # Environment Variable Format
    ///
    /// - `JOBSHEET_PRO__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `JOBSHEET_PRO__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - a required variable is absent
    /// - a value does not parse into its field type
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("JOBSHEET_PRO")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates every configuration section
    ///
    /// Semantic checks beyond deserialization:
    /// - URL formats
    /// - Pool size constraints
    /// - Required API key prefixes
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.email.validate()?;
        Ok(())
    }

    /// True when the server section reports a production deployment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
