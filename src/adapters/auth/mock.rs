//! Mock session validator for tests and local runs.
//!
//! Maps fixed bearer tokens to users, so HTTP tests can authenticate without
//! signing JWTs.
//!
//! # Example
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_user("user-token", AuthenticatedUser::new(user_id, None))
//!     .with_user("admin-token", AuthenticatedUser::new(admin_id, None).with_role("admin"));
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Session validator backed by a token table.
///
/// Tokens not in the table return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Returned for every validation while set.
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token that resolves to `user`.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *write(&self.force_error) = Some(error);
        self
    }

    pub fn clear_error(&self) {
        *write(&self.force_error) = None;
    }

    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        write(&self.tokens).insert(token.into(), user);
    }

    pub fn remove_token(&self, token: &str) {
        write(&self.tokens).remove(token);
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = read(&self.force_error).clone() {
            return Err(error);
        }

        read(&self.tokens)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn test_user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("user-123").unwrap(), Some("test@example.com".into()))
    }

    #[tokio::test]
    async fn returns_user_for_registered_token() {
        let validator = MockSessionValidator::new().with_user("valid-token", test_user());

        let user = validator.validate("valid-token").await.unwrap();

        assert_eq!(user.id.as_str(), "user-123");
        assert_eq!(user.email.as_deref(), Some("test@example.com"));
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = MockSessionValidator::new();

        let result = validator.validate("unknown-token").await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn forced_error_wins_until_cleared() {
        let validator = MockSessionValidator::new()
            .with_user("valid-token", test_user())
            .with_error(AuthError::service_unavailable("down"));

        assert!(matches!(
            validator.validate("valid-token").await,
            Err(AuthError::ServiceUnavailable(_))
        ));

        validator.clear_error();

        assert!(validator.validate("valid-token").await.is_ok());
    }

    #[tokio::test]
    async fn removed_token_no_longer_validates() {
        let validator = MockSessionValidator::new().with_user("token", test_user());
        assert!(validator.validate("token").await.is_ok());

        validator.remove_token("token");

        assert!(validator.validate("token").await.is_err());
    }
}
