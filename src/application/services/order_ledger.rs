//! OrderLedger - owns the lifecycle of order records.
//!
//! Creation, confirmation claims and the two terminal transitions. Every
//! terminal write is conditional on the order still being Pending and on the
//! caller holding the claim, so a transition happens at most once.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::foundation::{OrderId, SubscriptionId, TermId, Timestamp, UserId};
use crate::domain::order::{ConfirmationClaim, Order, OrderError, PaymentMethod};
use crate::domain::plan::PlanCode;
use crate::ports::{OrderRepository, TermsPolicy, UnitOfWork};

use super::PlanCatalog;

/// Input to [`OrderLedger::create_order`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub plan_code: PlanCode,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub agreed_term_ids: Vec<TermId>,
}

pub struct OrderLedger {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<PlanCatalog>,
    terms: Arc<dyn TermsPolicy>,
    gateway_provider: String,
}

impl OrderLedger {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<PlanCatalog>,
        terms: Arc<dyn TermsPolicy>,
        gateway_provider: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            catalog,
            terms,
            gateway_provider: gateway_provider.into(),
        }
    }

    /// Validate the plan and terms, then persist a Pending order.
    pub async fn create_order(&self, request: NewOrder) -> Result<Order, OrderError> {
        let plan = self
            .catalog
            .resolve(&request.plan_code, request.amount)
            .await?;

        let agreed: HashSet<TermId> = request.agreed_term_ids.into_iter().collect();
        let missing: Vec<TermId> = self
            .terms
            .required_payment_terms()
            .await?
            .into_iter()
            .filter(|term| !agreed.contains(term))
            .collect();
        if !missing.is_empty() {
            return Err(OrderError::terms_not_agreed(missing));
        }

        let order = Order::create(
            request.user_id,
            plan.code,
            plan.monthly_price,
            request.payment_method,
            self.gateway_provider.clone(),
        );
        self.orders.save(&order).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            plan_code = %order.plan_code,
            amount = order.amount,
            transaction_ref = %order.transaction_ref,
            "Order created"
        );

        Ok(order)
    }

    /// Load an order or fail with `NotFound`.
    pub async fn get(&self, id: &OrderId) -> Result<Order, OrderError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(*id))
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.find_by_user(user_id).await?)
    }

    /// Take the confirmation claim on a Pending order.
    ///
    /// # Errors
    ///
    /// `Conflict` if another caller holds the claim or the order left Pending.
    pub async fn claim(&self, order: &Order, lease_secs: u64) -> Result<ConfirmationClaim, OrderError> {
        let now = Timestamp::now();
        let claim = ConfirmationClaim::issue(now, lease_secs);
        if !self.orders.try_claim(&order.id, &claim, now).await? {
            tracing::warn!(order_id = %order.id, "Confirmation already in progress or order settled");
            return Err(OrderError::conflict(
                order.id,
                "another confirmation is in progress or the order is settled",
            ));
        }
        Ok(claim)
    }

    /// Give the claim back. Failures are logged; the lease expires anyway.
    pub async fn release(&self, order: &Order, claim: &ConfirmationClaim) {
        if let Err(e) = self.orders.release_claim(&order.id, &claim.token).await {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to release confirmation claim");
        }
    }

    /// Stage the order's completion in `uow`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the order is not Pending or the claim was lost.
    pub async fn mark_completed(
        &self,
        uow: &mut dyn UnitOfWork,
        order: &mut Order,
        claim: &ConfirmationClaim,
        subscription_id: SubscriptionId,
        gateway_response: Option<String>,
    ) -> Result<(), OrderError> {
        let now = Timestamp::now();
        let applied = uow
            .complete_order(
                &order.id,
                &claim.token,
                &subscription_id,
                gateway_response.as_deref(),
                now,
            )
            .await?;
        if !applied {
            return Err(OrderError::invalid_transition(format!(
                "order {} is no longer pending under this claim",
                order.id
            )));
        }
        order.complete(subscription_id, gateway_response, now)?;
        Ok(())
    }

    /// Move a claimed order to Failed.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the order is not Pending or the claim was lost.
    pub async fn mark_failed(
        &self,
        order: &mut Order,
        claim: &ConfirmationClaim,
        gateway_response: Option<String>,
    ) -> Result<(), OrderError> {
        let now = Timestamp::now();
        let applied = self
            .orders
            .mark_failed(&order.id, &claim.token, gateway_response.as_deref(), now)
            .await?;
        if !applied {
            return Err(OrderError::invalid_transition(format!(
                "order {} is no longer pending under this claim",
                order.id
            )));
        }
        order.fail(gateway_response, now)?;
        Ok(())
    }

    /// Flag an order for manual reconciliation, keeping its claim.
    pub async fn flag_for_reconciliation(&self, order: &mut Order) -> Result<(), OrderError> {
        let now = Timestamp::now();
        self.orders.flag_for_reconciliation(&order.id, now).await?;
        order.flag_for_reconciliation(now);
        Ok(())
    }
}
