//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the `config`
//! and `dotenvy` crates. Variables use the `PLAN_COMMERCE` prefix and `__`
//! between nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use plan_commerce::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod checkout;
mod database;
mod error;
mod gateway;
mod server;

pub use auth::AuthConfig;
pub use checkout::CheckoutConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::{GatewayConfig, GatewayProvider};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "PLAN_COMMERCE";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Bearer token validation
    pub auth: AuthConfig,

    /// Payment gateway selection and credentials
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Confirmation lease and required terms
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` when present, then reads `PLAN_COMMERCE__*` variables:
    ///
    /// - `PLAN_COMMERCE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PLAN_COMMERCE__GATEWAY__PROVIDER=http` -> `gateway.provider = http`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.gateway.validate(&self.server.environment)?;
        self.checkout.validate(
            self.gateway.timeout_secs,
            self.database.acquire_timeout_secs,
        )?;
        if self.server.request_timeout_secs <= 2 * self.gateway.timeout_secs {
            return Err(ValidationError::RequestTimeoutTooShort);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
