//! EntitlementProvisioner - grants the subscription an approved order paid for.

use crate::domain::foundation::{DomainError, OrderId, Timestamp, UserId};
use crate::domain::plan::Plan;
use crate::domain::subscription::Subscription;
use crate::ports::UnitOfWork;

/// Stages a new subscription and the user's plan marker in a unit of work.
///
/// Nothing is visible until the caller commits the unit of work together with
/// the order's completion.
#[derive(Debug, Default)]
pub struct EntitlementProvisioner;

impl EntitlementProvisioner {
    pub fn new() -> Self {
        Self
    }

    pub async fn provision(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: &UserId,
        plan: &Plan,
        payment_id: OrderId,
    ) -> Result<Subscription, DomainError> {
        let subscription = Subscription::grant(user_id.clone(), plan, payment_id, Timestamp::now());

        uow.insert_subscription(&subscription).await?;
        uow.set_user_plan(user_id, &plan.code).await?;

        Ok(subscription)
    }
}
