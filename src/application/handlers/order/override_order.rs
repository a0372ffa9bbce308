//! Administrative override of a Pending order.
//!
//! Lets an operator settle an order whose payment was resolved out of band.
//! The override goes through the same claim and unit of work as a normal
//! confirmation; it only skips the gateway.

use std::sync::Arc;

use crate::domain::foundation::{AuthenticatedUser, OrderId, UserId};
use crate::domain::order::{Order, OrderError};
use crate::domain::subscription::Subscription;

use super::{ConfirmOutcome, ConfirmationOrchestrator};

/// Capability to override orders. Only obtainable from an admin user.
#[derive(Debug, Clone)]
pub struct AdministrativeOverride {
    operator: UserId,
}

impl AdministrativeOverride {
    /// # Errors
    ///
    /// `AdminRequired` unless the user carries the admin role.
    pub fn authorize(user: &AuthenticatedUser) -> Result<Self, OrderError> {
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Administrative override denied");
            return Err(OrderError::AdminRequired);
        }
        Ok(Self {
            operator: user.id.clone(),
        })
    }

    pub fn operator(&self) -> &UserId {
        &self.operator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideAction {
    ForceSuccess,
    ForceFailure,
}

#[derive(Debug, Clone)]
pub struct OverrideOrderCommand {
    pub order_id: OrderId,
    pub action: OverrideAction,
}

#[derive(Debug, Clone)]
pub struct OverrideOrderResult {
    pub order: Order,
    pub subscription: Option<Subscription>,
}

pub struct OverrideOrderHandler {
    orchestrator: Arc<ConfirmationOrchestrator>,
}

impl OverrideOrderHandler {
    pub fn new(orchestrator: Arc<ConfirmationOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(
        &self,
        grant: &AdministrativeOverride,
        cmd: OverrideOrderCommand,
    ) -> Result<OverrideOrderResult, OrderError> {
        match cmd.action {
            OverrideAction::ForceSuccess => {
                match self.orchestrator.force_success(grant, &cmd.order_id).await? {
                    ConfirmOutcome::Completed {
                        order,
                        subscription,
                    } => Ok(OverrideOrderResult {
                        order,
                        subscription: Some(subscription),
                    }),
                    ConfirmOutcome::Declined { order } => Ok(OverrideOrderResult {
                        order,
                        subscription: None,
                    }),
                }
            }
            OverrideAction::ForceFailure => {
                let order = self.orchestrator.force_failure(grant, &cmd.order_id).await?;
                Ok(OverrideOrderResult {
                    order,
                    subscription: None,
                })
            }
        }
    }
}
