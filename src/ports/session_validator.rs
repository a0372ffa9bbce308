//! Session validation port for bearer token validation.
//!
//! Turns an access token into the caller's identity. Provider-agnostic:
//! a JWT implementation and a mock exist.
//!
//! All implementations MUST validate:
//! - **Signature**
//! - **Issuer (iss)** and **Audience (aud)** when configured
//! - **Expiry (exp)**

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// - `AuthError::InvalidToken` for malformed or badly signed tokens
/// - `AuthError::TokenExpired` for expired tokens
/// - `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct TestSessionValidator {
        tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    }

    #[async_trait]
    impl SessionValidator for TestSessionValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn session_validator_returns_user_for_known_token() {
        let mut tokens = HashMap::new();
        tokens.insert(
            "valid".to_string(),
            AuthenticatedUser::new(UserId::new("user-123").unwrap(), None),
        );
        let validator = TestSessionValidator {
            tokens: RwLock::new(tokens),
        };

        let user = validator.validate("valid").await.unwrap();
        assert_eq!(user.id.as_str(), "user-123");
        assert!(matches!(
            validator.validate("other").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn session_validator_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SessionValidator>();
    }
}
