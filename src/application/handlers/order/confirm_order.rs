//! ConfirmationOrchestrator - the confirm-payment saga.
//!
//! Drives one Pending order through the gateway and into a terminal status:
//!
//! ```text
//! load ─► owner? ─► pending? ─► amount/ref match? ─► claim ─► approve
//!                                                              │
//!        ┌──────────────── declined ◄──────────────────────────┤
//!        ▼                                                     │ unknown outcome
//!   mark_failed                                 release claim ◄┤
//!                                                              │ approved
//!                   ┌─ unit of work: provision + mark_completed ┘
//!                   │
//!             commit ok ─► Completed
//!             error ─► rollback ─► compensate (gateway cancel)
//!                                   ├─ cancelled ─► ProvisioningFailed, claim released
//!                                   └─ failed ────► CompensationFailed, order flagged
//!             claim lost ─► reload ─► settled or held elsewhere ─► Conflict, no cancel
//!                                 └─► pending and free ─► re-claim ─► compensate
//! ```
//!
//! Everything after the claim runs on a spawned task, so dropping the caller's
//! future does not interrupt it.
//!
//! The gateway is never called while a database transaction is open. The
//! unit of work wraps only the local provisioning and completion writes.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, UserId};
use crate::domain::order::{ConfirmationClaim, Order, OrderError};
use crate::domain::subscription::Subscription;
use crate::ports::{ApprovalRequest, CancelRequest, PaymentGateway, UnitOfWorkFactory};

use crate::application::services::{EntitlementProvisioner, OrderLedger, PlanCatalog};

use super::AdministrativeOverride;

/// Lease on a confirmation claim when none is configured.
pub const DEFAULT_CLAIM_LEASE_SECS: u64 = 120;

/// Alert tag on error logs that need an operator.
const RECONCILIATION_ALERT: &str = "payment_reconciliation_required";

/// Command to confirm a payment for an order.
#[derive(Debug, Clone)]
pub struct ConfirmOrderCommand {
    pub user_id: UserId,
    pub order_id: OrderId,
    pub transaction_ref: String,
    pub amount: i64,
}

/// Normal outcomes of a confirmation. A decline is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Completed {
        order: Order,
        subscription: Subscription,
    },
    Declined {
        order: Order,
    },
}

impl ConfirmOutcome {
    pub fn order(&self) -> &Order {
        match self {
            ConfirmOutcome::Completed { order, .. } | ConfirmOutcome::Declined { order } => order,
        }
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        match self {
            ConfirmOutcome::Completed { subscription, .. } => Some(subscription),
            ConfirmOutcome::Declined { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct ConfirmationOrchestrator {
    catalog: Arc<PlanCatalog>,
    ledger: Arc<OrderLedger>,
    provisioner: Arc<EntitlementProvisioner>,
    gateway: Arc<dyn PaymentGateway>,
    units: Arc<dyn UnitOfWorkFactory>,
    claim_lease_secs: u64,
}

impl ConfirmationOrchestrator {
    pub fn new(
        catalog: Arc<PlanCatalog>,
        ledger: Arc<OrderLedger>,
        provisioner: Arc<EntitlementProvisioner>,
        gateway: Arc<dyn PaymentGateway>,
        units: Arc<dyn UnitOfWorkFactory>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            provisioner,
            gateway,
            units,
            claim_lease_secs: DEFAULT_CLAIM_LEASE_SECS,
        }
    }

    pub fn with_claim_lease_secs(mut self, secs: u64) -> Self {
        self.claim_lease_secs = secs;
        self
    }

    pub async fn confirm(&self, cmd: ConfirmOrderCommand) -> Result<ConfirmOutcome, OrderError> {
        // 1. Load and authorize
        let order = self.ledger.get(&cmd.order_id).await?;
        if !order.is_owned_by(&cmd.user_id) {
            tracing::warn!(order_id = %order.id, user_id = %cmd.user_id, "Confirm attempted by non-owner");
            return Err(OrderError::Forbidden(order.id));
        }

        // 2. Settled orders never re-run side effects
        if !order.is_pending() {
            tracing::warn!(order_id = %order.id, status = %order.status, "Confirm on settled order");
            return Err(OrderError::conflict(
                order.id,
                format!("order is already {}", order.status),
            ));
        }

        // 3. Request must match what was ordered
        if cmd.amount != order.amount {
            return Err(OrderError::amount_mismatch(order.amount, cmd.amount));
        }
        if cmd.transaction_ref != order.transaction_ref.as_str() {
            return Err(OrderError::ReferenceMismatch);
        }

        // 4. Only one caller proceeds past here
        let claim = self.ledger.claim(&order, self.claim_lease_secs).await?;

        // 5-6 run on their own task: once approve may have moved money, a
        // dropped request must not stop the saga before commit or compensation.
        let saga = self.clone();
        let order_id = order.id;
        tokio::spawn(async move { saga.settle(order, claim).await })
            .await
            .map_err(|e| {
                tracing::error!(
                    alert = RECONCILIATION_ALERT,
                    order_id = %order_id,
                    error = %e,
                    "Confirmation task did not finish"
                );
                OrderError::infrastructure(format!("confirmation task failed: {}", e))
            })?
    }

    /// Approve under `claim`, then commit or compensate.
    async fn settle(
        &self,
        mut order: Order,
        claim: ConfirmationClaim,
    ) -> Result<ConfirmOutcome, OrderError> {
        // 5. Gateway approval, outside any transaction
        let approval = match self
            .gateway
            .approve(ApprovalRequest {
                order_id: order.id,
                transaction_ref: order.transaction_ref.clone(),
                amount: order.amount,
                method: order.payment_method,
            })
            .await
        {
            Ok(approval) => approval,
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id,
                    transaction_ref = %order.transaction_ref,
                    error = %e,
                    "Gateway approve outcome unknown; order left pending"
                );
                self.ledger.release(&order, &claim).await;
                return Err(OrderError::gateway_unavailable(e.to_string()));
            }
        };

        if !approval.approved {
            self.ledger
                .mark_failed(&mut order, &claim, Some(approval.raw_response))
                .await?;
            tracing::warn!(
                order_id = %order.id,
                transaction_ref = %order.transaction_ref,
                "Payment declined by gateway"
            );
            return Ok(ConfirmOutcome::Declined { order });
        }

        // 6. Local commit, compensating on failure
        match self
            .provision_and_complete(&order, &claim, Some(approval.raw_response))
            .await
        {
            Ok((order, subscription)) => {
                tracing::info!(
                    order_id = %order.id,
                    user_id = %order.user_id,
                    subscription_id = %subscription.id,
                    plan_code = %order.plan_code,
                    "Order completed"
                );
                Ok(ConfirmOutcome::Completed {
                    order,
                    subscription,
                })
            }
            Err(cause @ OrderError::InvalidTransition(_)) => {
                Err(self.after_lost_claim(order, cause).await)
            }
            Err(cause) => Err(self.compensate(order, &claim, cause).await),
        }
    }

    /// The completion write found the claim gone: the lease ran out during
    /// approve. The payment reference is shared with whoever took over, so it
    /// is only cancelled once this caller owns the order again.
    async fn after_lost_claim(&self, order: Order, cause: OrderError) -> OrderError {
        let current = match self.ledger.get(&order.id).await {
            Ok(current) => current,
            Err(e) => {
                tracing::error!(
                    alert = RECONCILIATION_ALERT,
                    order_id = %order.id,
                    transaction_ref = %order.transaction_ref,
                    error = %e,
                    "Approved payment lost its claim and the order could not be reloaded"
                );
                return e;
            }
        };

        if !current.is_pending() {
            tracing::warn!(
                order_id = %current.id,
                status = %current.status,
                "Claim lost after approval; order settled by another confirmation"
            );
            return OrderError::conflict(
                current.id,
                format!("order is already {}", current.status),
            );
        }

        match self.ledger.claim(&current, self.claim_lease_secs).await {
            Ok(reclaimed) => self.compensate(current, &reclaimed, cause).await,
            Err(conflict) => {
                tracing::warn!(
                    order_id = %current.id,
                    transaction_ref = %current.transaction_ref,
                    "Claim lost after approval; another confirmation owns the order"
                );
                conflict
            }
        }
    }

    /// Complete a Pending order without a gateway call.
    ///
    /// Runs the same claim and unit of work as a confirmation.
    pub async fn force_success(
        &self,
        grant: &AdministrativeOverride,
        order_id: &OrderId,
    ) -> Result<ConfirmOutcome, OrderError> {
        let order = self.claimable(order_id).await?;
        let claim = self.ledger.claim(&order, self.claim_lease_secs).await?;
        let note = serde_json::json!({
            "override": "force_success",
            "operator": grant.operator().as_str(),
        })
        .to_string();
        let operator = grant.operator().clone();

        let saga = self.clone();
        let task = tokio::spawn(async move {
            match saga.provision_and_complete(&order, &claim, Some(note)).await {
                Ok(done) => Ok(done),
                Err(e) => {
                    saga.ledger.release(&order, &claim).await;
                    Err(e)
                }
            }
        });
        let (order, subscription) = task.await.map_err(|e| {
            OrderError::infrastructure(format!("override task failed: {}", e))
        })??;

        tracing::warn!(
            order_id = %order.id,
            operator = %operator,
            subscription_id = %subscription.id,
            "Order completed by administrative override"
        );
        Ok(ConfirmOutcome::Completed {
            order,
            subscription,
        })
    }

    /// Fail a Pending order without a gateway call.
    pub async fn force_failure(
        &self,
        grant: &AdministrativeOverride,
        order_id: &OrderId,
    ) -> Result<Order, OrderError> {
        let mut order = self.claimable(order_id).await?;
        let claim = self.ledger.claim(&order, self.claim_lease_secs).await?;
        let note = serde_json::json!({
            "override": "force_failure",
            "operator": grant.operator().as_str(),
        })
        .to_string();

        if let Err(e) = self.ledger.mark_failed(&mut order, &claim, Some(note)).await {
            self.ledger.release(&order, &claim).await;
            return Err(e);
        }
        tracing::warn!(
            order_id = %order.id,
            operator = %grant.operator(),
            "Order failed by administrative override"
        );
        Ok(order)
    }

    async fn claimable(&self, order_id: &OrderId) -> Result<Order, OrderError> {
        let order = self.ledger.get(order_id).await?;
        if !order.is_pending() {
            return Err(OrderError::conflict(
                order.id,
                format!("order is already {}", order.status),
            ));
        }
        Ok(order)
    }

    /// Provision and complete in one unit of work. Rolls back on any error.
    async fn provision_and_complete(
        &self,
        order: &Order,
        claim: &ConfirmationClaim,
        gateway_response: Option<String>,
    ) -> Result<(Order, Subscription), OrderError> {
        let plan = self
            .catalog
            .find(&order.plan_code)
            .await?
            .ok_or_else(|| OrderError::unknown_plan(order.plan_code.as_str()))?;

        let mut uow = self.units.begin().await?;
        let mut completed = order.clone();

        let staged = async {
            let subscription = self
                .provisioner
                .provision(uow.as_mut(), &order.user_id, &plan, order.id)
                .await?;
            self.ledger
                .mark_completed(
                    uow.as_mut(),
                    &mut completed,
                    claim,
                    subscription.id,
                    gateway_response,
                )
                .await?;
            Ok::<_, OrderError>(subscription)
        }
        .await;

        match staged {
            Ok(subscription) => {
                uow.commit().await?;
                Ok((completed, subscription))
            }
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::warn!(order_id = %order.id, error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Reverse an approved payment after the local commit failed.
    async fn compensate(
        &self,
        mut order: Order,
        claim: &ConfirmationClaim,
        cause: OrderError,
    ) -> OrderError {
        tracing::warn!(
            order_id = %order.id,
            transaction_ref = %order.transaction_ref,
            error = %cause,
            "Provisioning failed after approval; cancelling payment"
        );

        let cancel = self
            .gateway
            .cancel(CancelRequest {
                order_id: order.id,
                transaction_ref: order.transaction_ref.clone(),
                amount: order.amount,
            })
            .await;

        let failure = match cancel {
            Ok(response) if response.success => {
                self.ledger.release(&order, claim).await;
                return OrderError::provisioning_failed(order.id, cause.to_string());
            }
            Ok(response) => format!("gateway refused cancel: {}", response.raw_response),
            Err(e) => e.to_string(),
        };

        tracing::error!(
            alert = RECONCILIATION_ALERT,
            order_id = %order.id,
            user_id = %order.user_id,
            transaction_ref = %order.transaction_ref,
            amount = order.amount,
            cause = %cause,
            error = %failure,
            "Compensating cancel failed; payment captured without entitlement"
        );

        if let Err(e) = self.ledger.flag_for_reconciliation(&mut order).await {
            tracing::error!(
                alert = RECONCILIATION_ALERT,
                order_id = %order.id,
                error = %e,
                "Failed to flag order for reconciliation"
            );
        }

        OrderError::compensation_failed(order.id, order.transaction_ref.to_string(), failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::{ApproveBehavior, CancelBehavior};
    use crate::adapters::memory::FailurePoint;
    use crate::domain::order::OrderStatus;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::domain::foundation::Timestamp;
    use std::time::Duration;

    use super::super::fixtures::Fixture;

    fn confirm_cmd(order: &Order) -> ConfirmOrderCommand {
        ConfirmOrderCommand {
            user_id: order.user_id.clone(),
            order_id: order.id,
            transaction_ref: order.transaction_ref.to_string(),
            amount: order.amount,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Happy path
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn approved_payment_completes_order_and_grants_subscription() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;

        let outcome = fx.orchestrator().confirm(confirm_cmd(&order)).await.unwrap();

        let ConfirmOutcome::Completed {
            order: completed,
            subscription,
        } = outcome
        else {
            panic!("expected completion");
        };
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(completed.subscription_id, Some(subscription.id));
        assert_eq!(subscription.plan_type.as_str(), "pro");
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(
            subscription.expires_at,
            subscription.started_at.add_months(1)
        );
        assert_eq!(fx.store.user_plan(&fx.user).await.unwrap().as_str(), "pro");
        assert_eq!(
            fx.store.order(&order.id).await.unwrap().status,
            OrderStatus::Completed
        );
        assert_eq!(fx.gateway.approve_calls(), 1);
        assert_eq!(fx.gateway.cancel_calls(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotency and validation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn second_confirm_after_completion_conflicts_without_side_effects() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator();

        orchestrator.confirm(confirm_cmd(&order)).await.unwrap();
        let err = orchestrator.confirm(confirm_cmd(&order)).await.unwrap_err();

        assert!(matches!(err, OrderError::Conflict { .. }));
        assert_eq!(fx.store.subscriptions().await.len(), 1);
        assert_eq!(fx.gateway.approve_calls(), 1);
    }

    #[tokio::test]
    async fn amount_mismatch_is_rejected_before_gateway() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let mut cmd = confirm_cmd(&order);
        cmd.amount = 5000;

        let err = fx.orchestrator().confirm(cmd).await.unwrap_err();

        assert_eq!(err, OrderError::amount_mismatch(9900, 5000));
        assert_eq!(fx.gateway.approve_calls(), 0);
        assert_eq!(
            fx.store.order(&order.id).await.unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn reference_mismatch_is_rejected_before_gateway() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let mut cmd = confirm_cmd(&order);
        cmd.transaction_ref = "TXN_SOMETHING_ELSE".to_string();

        let err = fx.orchestrator().confirm(cmd).await.unwrap_err();

        assert_eq!(err, OrderError::ReferenceMismatch);
        assert_eq!(fx.gateway.approve_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let mut cmd = confirm_cmd(&order);
        cmd.order_id = OrderId::new();

        let err = fx.orchestrator().confirm(cmd).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound(_)));
    }

    #[tokio::test]
    async fn other_users_order_is_forbidden() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let mut cmd = confirm_cmd(&order);
        cmd.user_id = UserId::new("intruder").unwrap();

        let err = fx.orchestrator().confirm(cmd).await.unwrap_err();

        assert_eq!(err, OrderError::Forbidden(order.id));
        assert_eq!(fx.gateway.approve_calls(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Gateway outcomes
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn decline_fails_order_without_entitlement() {
        let fx = Fixture::new().await;
        fx.gateway.set_approve_behavior(ApproveBehavior::Decline);
        let order = fx.pending_order().await;

        let outcome = fx.orchestrator().confirm(confirm_cmd(&order)).await.unwrap();

        assert!(matches!(outcome, ConfirmOutcome::Declined { .. }));
        assert_eq!(outcome.order().status, OrderStatus::Failed);
        assert!(outcome.subscription().is_none());
        assert!(fx.store.subscriptions().await.is_empty());
        assert!(fx.store.user_plan(&fx.user).await.is_none());
        assert_eq!(fx.gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn unavailable_gateway_leaves_order_pending_and_retryable() {
        let fx = Fixture::new().await;
        fx.gateway.set_approve_behavior(ApproveBehavior::Timeout);
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator();

        let err = orchestrator.confirm(confirm_cmd(&order)).await.unwrap_err();

        assert!(matches!(err, OrderError::GatewayUnavailable(_)));
        assert!(err.is_retryable());
        assert_eq!(
            fx.store.order(&order.id).await.unwrap().status,
            OrderStatus::Pending
        );
        assert!(fx.store.claim_of(&order.id).await.is_none());
        assert_eq!(fx.gateway.cancel_calls(), 0);

        fx.gateway.set_approve_behavior(ApproveBehavior::Approve);
        let outcome = orchestrator.confirm(confirm_cmd(&order)).await.unwrap();
        assert_eq!(outcome.order().status, OrderStatus::Completed);
        let refs: Vec<String> = fx
            .gateway
            .calls()
            .into_iter()
            .map(|c| c.transaction_ref)
            .collect();
        assert_eq!(refs, vec![order.transaction_ref.to_string(); 2]);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Compensation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn provisioning_failure_cancels_payment_and_rolls_back() {
        let fx = Fixture::new().await;
        fx.store.fail_at(FailurePoint::CompleteOrder).await;
        let order = fx.pending_order().await;

        let err = fx.orchestrator().confirm(confirm_cmd(&order)).await.unwrap_err();

        assert!(matches!(err, OrderError::ProvisioningFailed { .. }));
        assert_eq!(fx.gateway.cancel_calls(), 1);
        assert!(fx.store.subscriptions().await.is_empty());
        assert!(fx.store.user_plan(&fx.user).await.is_none());
        let stored = fx.store.order(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(!stored.reconciliation_required);
        assert!(fx.store.claim_of(&order.id).await.is_none());
    }

    #[tokio::test]
    async fn commit_failure_is_compensated() {
        let fx = Fixture::new().await;
        fx.store.fail_at(FailurePoint::Commit).await;
        let order = fx.pending_order().await;

        let err = fx.orchestrator().confirm(confirm_cmd(&order)).await.unwrap_err();

        assert!(matches!(err, OrderError::ProvisioningFailed { .. }));
        assert_eq!(fx.gateway.cancel_calls(), 1);
        assert!(fx.store.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_record_is_compensated() {
        let fx = Fixture::new().await;
        let stranger = UserId::new("no-record").unwrap();
        let order = fx.pending_order_for(&stranger).await;

        let err = fx.orchestrator().confirm(confirm_cmd(&order)).await.unwrap_err();

        assert!(matches!(err, OrderError::ProvisioningFailed { .. }));
        assert_eq!(fx.gateway.cancel_calls(), 1);
        assert!(fx.store.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn failed_cancel_surfaces_compensation_failure_and_flags_order() {
        let fx = Fixture::new().await;
        fx.store.fail_at(FailurePoint::InsertSubscription).await;
        fx.gateway.set_cancel_behavior(CancelBehavior::Unavailable);
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator();

        let err = orchestrator.confirm(confirm_cmd(&order)).await.unwrap_err();

        assert!(matches!(err, OrderError::CompensationFailed { .. }));
        assert!(err.requires_reconciliation());
        assert!(!err.is_retryable());
        assert_eq!(fx.gateway.cancel_calls(), 1);
        let stored = fx.store.order(&order.id).await.unwrap();
        assert_ne!(stored.status, OrderStatus::Completed);
        assert!(stored.reconciliation_required);
        assert!(fx.store.subscriptions().await.is_empty());

        // Flagged orders are not retried automatically
        fx.store.clear_failures().await;
        let retry = orchestrator.confirm(confirm_cmd(&order)).await.unwrap_err();
        assert!(matches!(retry, OrderError::Conflict { .. }));
        assert_eq!(fx.gateway.approve_calls(), 1);
    }

    #[tokio::test]
    async fn refused_cancel_is_a_compensation_failure() {
        let fx = Fixture::new().await;
        fx.store.fail_at(FailurePoint::SetUserPlan).await;
        fx.gateway.set_cancel_behavior(CancelBehavior::Refuse);
        let order = fx.pending_order().await;

        let err = fx.orchestrator().confirm(confirm_cmd(&order)).await.unwrap_err();

        assert!(matches!(err, OrderError::CompensationFailed { .. }));
        assert_eq!(fx.gateway.cancel_calls(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Concurrency
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_confirms_complete_exactly_once() {
        let fx = Fixture::new().await;
        fx.gateway.set_latency(Duration::from_millis(50));
        let order = fx.pending_order().await;
        let orchestrator = Arc::new(fx.orchestrator());

        let (first, second) = tokio::join!(
            orchestrator.confirm(confirm_cmd(&order)),
            orchestrator.confirm(confirm_cmd(&order))
        );

        let results = [first, second];
        let completed = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(OrderError::Conflict { .. })))
            .count();
        assert_eq!(completed, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(fx.gateway.approve_calls(), 1);
        assert_eq!(fx.store.subscriptions().await.len(), 1);
        assert_eq!(
            fx.store.order(&order.id).await.unwrap().status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn expired_claim_lets_a_retry_through() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let stale = ConfirmationClaim::issue(Timestamp::now(), 0);
        fx.store_claim(&order, &stale).await;

        let outcome = fx.orchestrator().confirm(confirm_cmd(&order)).await.unwrap();
        assert_eq!(outcome.order().status, OrderStatus::Completed);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Administrative override
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn force_success_provisions_without_gateway() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;

        let outcome = fx
            .orchestrator()
            .force_success(&fx.admin_grant(), &order.id)
            .await
            .unwrap();

        assert_eq!(outcome.order().status, OrderStatus::Completed);
        assert!(outcome.subscription().is_some());
        assert_eq!(fx.gateway.approve_calls(), 0);
        assert_eq!(fx.store.subscriptions().await.len(), 1);
    }

    #[tokio::test]
    async fn force_failure_fails_pending_order() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;

        let failed = fx
            .orchestrator()
            .force_failure(&fx.admin_grant(), &order.id)
            .await
            .unwrap();

        assert_eq!(failed.status, OrderStatus::Failed);
        assert!(failed
            .gateway_response
            .as_deref()
            .unwrap()
            .contains("force_failure"));
        assert_eq!(fx.gateway.approve_calls(), 0);
    }

    #[tokio::test]
    async fn override_on_settled_order_conflicts() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator();
        orchestrator.confirm(confirm_cmd(&order)).await.unwrap();

        let err = orchestrator
            .force_failure(&fx.admin_grant(), &order.id)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Conflict { .. }));
        assert_eq!(fx.store.subscriptions().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_forced_success_releases_claim_without_cancel() {
        let fx = Fixture::new().await;
        fx.store.fail_at(FailurePoint::Commit).await;
        let order = fx.pending_order().await;

        let result = fx
            .orchestrator()
            .force_success(&fx.admin_grant(), &order.id)
            .await;

        assert!(result.is_err());
        assert_eq!(fx.gateway.cancel_calls(), 0);
        assert!(fx.store.claim_of(&order.id).await.is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Abandoned requests and expired claims
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn abandoned_confirm_still_completes_after_approval() {
        let fx = Fixture::new().await;
        fx.gateway.set_latency(Duration::from_millis(50));
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            orchestrator.confirm(confirm_cmd(&order)),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let stored = fx.store.order(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
        assert_eq!(fx.store.subscriptions().await.len(), 1);
    }

    #[tokio::test]
    async fn abandoned_confirm_still_flags_failed_compensation() {
        let fx = Fixture::new().await;
        fx.gateway.set_latency(Duration::from_millis(50));
        fx.gateway.set_cancel_behavior(CancelBehavior::Unavailable);
        fx.store.fail_at(FailurePoint::CompleteOrder).await;
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(75),
            orchestrator.confirm(confirm_cmd(&order)),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fx.gateway.approve_calls(), 1);
        assert_eq!(fx.gateway.cancel_calls(), 1);
        let stored = fx.store.order(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.reconciliation_required);
    }

    #[tokio::test]
    async fn expired_claim_never_cancels_a_payment_another_confirm_completed() {
        let fx = Fixture::new().await;
        fx.gateway.set_latency(Duration::from_millis(1500));
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator().with_claim_lease_secs(1);

        let first = orchestrator.confirm(confirm_cmd(&order));
        let second = async {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            orchestrator.confirm(confirm_cmd(&order)).await
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(OrderError::Conflict { .. })));
        assert!(matches!(second, Ok(ConfirmOutcome::Completed { .. })));
        assert_eq!(fx.gateway.cancel_calls(), 0);
        assert_eq!(fx.store.subscriptions().await.len(), 1);
        assert_eq!(
            fx.store.order(&order.id).await.unwrap().status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn lost_claim_on_settled_order_is_a_conflict_without_cancel() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let orchestrator = fx.orchestrator();
        orchestrator.confirm(confirm_cmd(&order)).await.unwrap();

        let err = orchestrator
            .after_lost_claim(order, OrderError::invalid_transition("claim lost"))
            .await;

        assert!(matches!(err, OrderError::Conflict { .. }));
        assert_eq!(fx.gateway.cancel_calls(), 0);
    }

    #[tokio::test]
    async fn lost_claim_on_unowned_pending_order_is_reclaimed_and_compensated() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;

        let err = fx
            .orchestrator()
            .after_lost_claim(order.clone(), OrderError::invalid_transition("claim lost"))
            .await;

        assert!(matches!(err, OrderError::ProvisioningFailed { .. }));
        assert_eq!(fx.gateway.cancel_calls(), 1);
        assert!(fx.store.claim_of(&order.id).await.is_none());
    }

    #[tokio::test]
    async fn lost_claim_while_another_confirm_holds_it_leaves_payment_alone() {
        let fx = Fixture::new().await;
        let order = fx.pending_order().await;
        let other = ConfirmationClaim::issue(Timestamp::now(), 60);
        fx.store_claim(&order, &other).await;

        let err = fx
            .orchestrator()
            .after_lost_claim(order.clone(), OrderError::invalid_transition("claim lost"))
            .await;

        assert!(matches!(err, OrderError::Conflict { .. }));
        assert_eq!(fx.gateway.cancel_calls(), 0);
        assert_eq!(fx.store.claim_of(&order.id).await, Some(other));
    }
}
