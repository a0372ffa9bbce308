//! Authentication types for the domain layer.
//!
//! An authenticated caller as extracted from a bearer token. The types carry no
//! provider dependencies; any issuer can populate them through the
//! `SessionValidator` port.

use super::UserId;
use thiserror::Error;

/// Role name that unlocks administrative operations.
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated user extracted from a validated token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the auth provider.
    pub id: UserId,

    /// User's email address, when the token carries one.
    pub email: Option<String>,

    /// Roles granted by the issuer.
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user without roles.
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self {
            id,
            email,
            roles: Vec::new(),
        }
    }

    /// Adds a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Returns true if the user carries the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns true if the user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
