//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::gateway::HttpGatewayConfig;

/// Which gateway implementation to wire.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    /// In-process gateway that approves everything. Development only.
    #[default]
    Simulation,
    /// Remote processor over HTTP.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub provider: GatewayProvider,

    /// Processor API root (http provider)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Processor secret key (http provider)
    #[serde(default)]
    pub secret_key: Option<SecretString>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Name recorded on each order
    #[serde(default)]
    pub provider_name: Option<String>,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settings for the HTTP gateway; `None` unless the http provider is
    /// selected and fully configured.
    pub fn http_config(&self) -> Option<HttpGatewayConfig> {
        if self.provider != GatewayProvider::Http {
            return None;
        }
        let base_url = self.base_url.as_ref()?;
        let secret_key = self.secret_key.clone()?;

        let config = HttpGatewayConfig::new(base_url.clone(), secret_key, self.timeout());
        Some(match &self.provider_name {
            Some(name) => config.with_provider_name(name.clone()),
            None => config,
        })
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidGatewayTimeout);
        }

        match self.provider {
            GatewayProvider::Simulation => {
                if *environment == Environment::Production {
                    return Err(ValidationError::SimulationInProduction);
                }
            }
            GatewayProvider::Http => {
                let base_url = self
                    .base_url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .ok_or(ValidationError::MissingRequired("GATEWAY__BASE_URL"))?;
                let has_key = self
                    .secret_key
                    .as_ref()
                    .map_or(false, |k| !k.expose_secret().is_empty());
                if !has_key {
                    return Err(ValidationError::MissingRequired("GATEWAY__SECRET_KEY"));
                }
                if *environment == Environment::Production && !base_url.starts_with("https://") {
                    return Err(ValidationError::GatewayUrlMustBeHttps);
                }
            }
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::default(),
            base_url: None,
            secret_key: None,
            timeout_secs: default_timeout(),
            provider_name: None,
        }
    }
}

fn default_timeout() -> u64 {
    10
}
