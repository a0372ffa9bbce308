//! Order repository port (write side).
//!
//! Persists orders and provides the conditional updates that serialize
//! concurrent confirmations.
//!
//! # Design
//!
//! - **Claim before gateway**: `try_claim` is a single compare-and-swap; only
//!   one caller at a time holds an unexpired claim on a Pending order
//! - **Conditional terminal writes**: `mark_failed` only applies while the
//!   order is Pending and the caller still holds the claim
//! - **No transaction across the network**: nothing here is held open while
//!   the gateway is called
//!
//! Completion is written through [`UnitOfWork`](super::UnitOfWork) so it
//! commits atomically with provisioning.

use crate::domain::foundation::{ClaimToken, DomainError, OrderId, Timestamp, UserId};
use crate::domain::order::{ConfirmationClaim, Order};
use async_trait::async_trait;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Save a new order.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, order: &Order) -> Result<(), DomainError>;

    /// Find an order by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// List a user's orders, newest first.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError>;

    /// Try to take the confirmation claim on a Pending order.
    ///
    /// Succeeds only if the order is Pending, not flagged for
    /// reconciliation, and has no unexpired claim at `now`.
    /// Returns false when another caller holds the claim or the order left
    /// Pending.
    async fn try_claim(
        &self,
        id: &OrderId,
        claim: &ConfirmationClaim,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Give up a claim so the order can be confirmed again.
    ///
    /// A no-op when the token no longer matches.
    async fn release_claim(&self, id: &OrderId, token: &ClaimToken) -> Result<(), DomainError>;

    /// Move a claimed Pending order to Failed and clear the claim.
    ///
    /// Returns false when the order is no longer Pending or the claim was
    /// lost; nothing is written in that case.
    async fn mark_failed(
        &self,
        id: &OrderId,
        token: &ClaimToken,
        gateway_response: Option<&str>,
        at: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Flag an order for manual reconciliation. The claim is kept, so the
    /// order cannot be confirmed again until an operator intervenes.
    async fn flag_for_reconciliation(&self, id: &OrderId, at: Timestamp) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn OrderRepository) {}
    }
}
