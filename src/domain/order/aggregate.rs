//! Order aggregate entity.
//!
//! An Order is the record of one purchase attempt. It is created Pending with
//! the plan's price and a fresh gateway transaction reference, and is moved to
//! a terminal status exactly once by the confirmation workflow.
//!
//! # Design Decisions
//!
//! - **Money in minor units**: amounts are `i64` in the smallest currency unit
//! - **Price frozen at creation**: later plan price changes do not touch the order
//! - **Raw gateway payloads kept verbatim**: for manual reconciliation

use crate::domain::foundation::{
    DomainError, ErrorCode, OrderId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::plan::PlanCode;
use serde::{Deserialize, Serialize};

use super::{OrderStatus, PaymentMethod, TransactionRef};

/// Order aggregate - one purchase attempt of a plan by a user.
///
/// # Invariants
///
/// - `amount` equals the plan price at creation time
/// - `subscription_id` is set only when status is Completed
/// - Status transitions follow [`OrderStatus`] rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// User who placed the order.
    pub user_id: UserId,

    pub plan_code: PlanCode,

    /// Charged amount in minor currency units.
    pub amount: i64,

    pub payment_method: PaymentMethod,

    pub status: OrderStatus,

    /// Name of the gateway the order was routed to.
    pub gateway_provider: String,

    /// Idempotency key for every gateway call made for this order.
    pub transaction_ref: TransactionRef,

    /// Last raw response received from the gateway.
    pub gateway_response: Option<String>,

    /// Subscription granted by this order (Completed only).
    pub subscription_id: Option<SubscriptionId>,

    /// Set when a compensating cancel failed and the order needs manual
    /// reconciliation. Flagged orders cannot be claimed again.
    pub reconciliation_required: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

impl Order {
    /// Creates a new Pending order with a freshly generated transaction reference.
    pub fn create(
        user_id: UserId,
        plan_code: PlanCode,
        amount: i64,
        payment_method: PaymentMethod,
        gateway_provider: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: OrderId::new(),
            user_id,
            plan_code,
            amount,
            payment_method,
            status: OrderStatus::Pending,
            gateway_provider: gateway_provider.into(),
            transaction_ref: TransactionRef::generate(),
            gateway_response: None,
            subscription_id: None,
            reconciliation_required: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Marks the order Completed and links the granted subscription.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the order is Pending.
    pub fn complete(
        &mut self,
        subscription_id: SubscriptionId,
        gateway_response: Option<String>,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Completed)?;
        self.subscription_id = Some(subscription_id);
        self.gateway_response = gateway_response;
        self.completed_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Marks the order Failed after a gateway decline.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the order is Pending.
    pub fn fail(&mut self, gateway_response: Option<String>, at: Timestamp) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Failed)?;
        self.gateway_response = gateway_response;
        self.updated_at = at;
        Ok(())
    }

    /// Flags the order for manual reconciliation.
    pub fn flag_for_reconciliation(&mut self, at: Timestamp) {
        self.reconciliation_required = true;
        self.updated_at = at;
    }

    fn transition_to(&mut self, target: OrderStatus) -> Result<(), DomainError> {
        use crate::domain::foundation::StateMachine;

        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition order {} from {} to {}",
                    self.id, self.status, target
                ),
            )
        })?;
        Ok(())
    }
}
