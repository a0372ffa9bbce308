//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::auth::JwtConfig;

/// Shortest HS256 secret accepted.
const MIN_SECRET_BYTES: usize = 32;

/// Bearer token settings (HS256 JWT).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared signing secret
    pub jwt_secret: SecretString,

    /// Expected `iss` claim, if any
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected `aud` claim, if any
    #[serde(default)]
    pub audience: Option<String>,
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if secret.len() < MIN_SECRET_BYTES {
            return Err(ValidationError::JwtSecretTooShort(MIN_SECRET_BYTES));
        }
        Ok(())
    }
}
