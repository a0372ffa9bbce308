//! Unit of work port.
//!
//! Groups the local writes that must land together when a payment is
//! approved: the new subscription, the user's plan marker and the order's
//! completion. Either all of them are committed or none are.
//!
//! # Example
//!
//! ```ignore
//! let mut uow = factory.begin().await?;
//! uow.insert_subscription(&subscription).await?;
//! uow.set_user_plan(&user_id, &plan_code).await?;
//! if !uow.complete_order(&order_id, &token, &subscription.id, raw, now).await? {
//!     uow.rollback().await?;
//!     return Err(...);
//! }
//! uow.commit().await?;
//! ```

use crate::domain::foundation::{ClaimToken, DomainError, OrderId, SubscriptionId, Timestamp, UserId};
use crate::domain::plan::PlanCode;
use crate::domain::subscription::Subscription;
use async_trait::async_trait;

/// Opens units of work.
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError>;
}

/// An open local transaction. Dropping it without `commit` discards every
/// staged write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Stage a new subscription.
    async fn insert_subscription(&mut self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Stage the user's current-plan marker update.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user record does not exist
    async fn set_user_plan(&mut self, user_id: &UserId, plan_code: &PlanCode) -> Result<(), DomainError>;

    /// Stage the order's completion, conditional on it still being Pending
    /// and claimed with `token`. Clears the claim.
    ///
    /// Returns false when the condition does not hold.
    async fn complete_order(
        &mut self,
        id: &OrderId,
        token: &ClaimToken,
        subscription_id: &SubscriptionId,
        gateway_response: Option<&str>,
        at: Timestamp,
    ) -> Result<bool, DomainError>;

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
