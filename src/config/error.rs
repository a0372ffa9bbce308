//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("JWT secret must be at least {0} bytes")]
    JwtSecretTooShort(usize),

    #[error("Gateway base URL must use HTTPS in production")]
    GatewayUrlMustBeHttps,

    #[error("Simulation gateway is not allowed in production")]
    SimulationInProduction,

    #[error("Invalid gateway timeout")]
    InvalidGatewayTimeout,

    #[error("Claim lease must outlast the gateway timeout, a pool acquire and a {0}s margin")]
    ClaimLeaseTooShort(u64),

    #[error("Request timeout must be more than twice the gateway timeout")]
    RequestTimeoutTooShort,

    #[error("Invalid payment term id: {0}")]
    InvalidTermId(String),
}
