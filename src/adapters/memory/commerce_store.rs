//! In-memory commerce store.
//!
//! Implements every storage port (`PlanReader`, `OrderRepository`,
//! `UnitOfWorkFactory`, `TermsPolicy`) over one shared state so tests can
//! observe the effects of a workflow across ports.
//!
//! Units of work stage their writes and apply them under a single write lock
//! on commit, re-checking every condition first: either everything lands or
//! nothing does.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    ClaimToken, DomainError, ErrorCode, OrderId, SubscriptionId, TermId, Timestamp, UserId,
};
use crate::domain::order::{ConfirmationClaim, Order, OrderStatus};
use crate::domain::plan::{Plan, PlanCode};
use crate::domain::subscription::Subscription;
use crate::ports::{
    OrderRepository, PlanReader, TermsPolicy, UnitOfWork, UnitOfWorkFactory,
};

/// Operation that can be made to fail for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    BeginUnitOfWork,
    InsertSubscription,
    SetUserPlan,
    CompleteOrder,
    Commit,
    SaveOrder,
    MarkFailed,
}

#[derive(Default)]
struct StoreState {
    plans: HashMap<PlanCode, Plan>,
    orders: HashMap<OrderId, StoredOrder>,
    subscriptions: Vec<Subscription>,
    /// User id to current plan marker.
    users: HashMap<UserId, Option<PlanCode>>,
    required_terms: Vec<TermId>,
    failures: HashSet<FailurePoint>,
}

impl StoreState {
    fn check(&self, point: FailurePoint) -> Result<(), DomainError> {
        if self.failures.contains(&point) {
            return Err(DomainError::database(format!("Injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn holds_claim(&self, id: &OrderId, token: &ClaimToken) -> bool {
        self.orders.get(id).map_or(false, |stored| {
            stored.order.status == OrderStatus::Pending
                && stored.claim.map(|c| c.token) == Some(*token)
        })
    }
}

struct StoredOrder {
    order: Order,
    claim: Option<ConfirmationClaim>,
}

/// In-memory implementation of all storage ports.
#[derive(Clone, Default)]
pub struct InMemoryCommerceStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryCommerceStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Seeding
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn add_plan(&self, plan: Plan) {
        self.state.write().await.plans.insert(plan.code.clone(), plan);
    }

    /// Register a user record with no current plan.
    pub async fn add_user(&self, user_id: UserId) {
        self.state.write().await.users.insert(user_id, None);
    }

    pub async fn set_required_terms(&self, terms: Vec<TermId>) {
        self.state.write().await.required_terms = terms;
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Injection
    // ════════════════════════════════════════════════════════════════════════════

    /// Make every subsequent call at `point` fail with a database error.
    pub async fn fail_at(&self, point: FailurePoint) {
        self.state.write().await.failures.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn order(&self, id: &OrderId) -> Option<Order> {
        self.state.read().await.orders.get(id).map(|s| s.order.clone())
    }

    pub async fn claim_of(&self, id: &OrderId) -> Option<ConfirmationClaim> {
        self.state.read().await.orders.get(id).and_then(|s| s.claim)
    }

    pub async fn subscriptions(&self) -> Vec<Subscription> {
        self.state.read().await.subscriptions.clone()
    }

    /// Current plan marker of a user; `None` if unset or unknown.
    pub async fn user_plan(&self, user_id: &UserId) -> Option<PlanCode> {
        self.state
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .flatten()
    }
}

#[async_trait]
impl PlanReader for InMemoryCommerceStore {
    async fn find_by_code(&self, code: &PlanCode) -> Result<Option<Plan>, DomainError> {
        Ok(self.state.read().await.plans.get(code).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Plan>, DomainError> {
        let state = self.state.read().await;
        let mut plans: Vec<Plan> = state.plans.values().filter(|p| p.active).cloned().collect();
        plans.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.code.as_str().cmp(b.code.as_str()))
        });
        Ok(plans)
    }
}

#[async_trait]
impl TermsPolicy for InMemoryCommerceStore {
    async fn required_payment_terms(&self) -> Result<Vec<TermId>, DomainError> {
        Ok(self.state.read().await.required_terms.clone())
    }
}

#[async_trait]
impl OrderRepository for InMemoryCommerceStore {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        state.check(FailurePoint::SaveOrder)?;
        state.orders.insert(
            order.id,
            StoredOrder {
                order: order.clone(),
                claim: None,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.order(id).await)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|s| &s.order.user_id == user_id)
            .map(|s| s.order.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn try_claim(
        &self,
        id: &OrderId,
        claim: &ConfirmationClaim,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.orders.get_mut(id) else {
            return Ok(false);
        };

        let free = stored.claim.map_or(true, |existing| existing.is_expired_at(&now));
        if stored.order.status != OrderStatus::Pending
            || stored.order.reconciliation_required
            || !free
        {
            return Ok(false);
        }

        stored.claim = Some(*claim);
        Ok(true)
    }

    async fn release_claim(&self, id: &OrderId, token: &ClaimToken) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if let Some(stored) = state.orders.get_mut(id) {
            if stored.claim.map(|c| c.token) == Some(*token) {
                stored.claim = None;
            }
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: &OrderId,
        token: &ClaimToken,
        gateway_response: Option<&str>,
        at: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        state.check(FailurePoint::MarkFailed)?;
        if !state.holds_claim(id, token) {
            return Ok(false);
        }

        let Some(stored) = state.orders.get_mut(id) else {
            return Ok(false);
        };
        stored
            .order
            .fail(gateway_response.map(str::to_string), at)?;
        stored.claim = None;
        Ok(true)
    }

    async fn flag_for_reconciliation(&self, id: &OrderId, at: Timestamp) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(id) {
            Some(stored) => {
                stored.order.flag_for_reconciliation(at);
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order not found: {}", id),
            )),
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryCommerceStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        self.state.read().await.check(FailurePoint::BeginUnitOfWork)?;
        Ok(Box::new(InMemoryUnitOfWork {
            state: Arc::clone(&self.state),
            subscriptions: Vec::new(),
            user_plans: Vec::new(),
            completions: Vec::new(),
        }))
    }
}

struct StagedCompletion {
    order_id: OrderId,
    token: ClaimToken,
    subscription_id: SubscriptionId,
    gateway_response: Option<String>,
    at: Timestamp,
}

/// Staged writes against an [`InMemoryCommerceStore`].
pub struct InMemoryUnitOfWork {
    state: Arc<RwLock<StoreState>>,
    subscriptions: Vec<Subscription>,
    user_plans: Vec<(UserId, PlanCode)>,
    completions: Vec<StagedCompletion>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn insert_subscription(&mut self, subscription: &Subscription) -> Result<(), DomainError> {
        let state = self.state.read().await;
        state.check(FailurePoint::InsertSubscription)?;
        let duplicate = state
            .subscriptions
            .iter()
            .chain(self.subscriptions.iter())
            .any(|s| s.payment_id == subscription.payment_id);
        if duplicate {
            return Err(DomainError::database(format!(
                "Subscription already exists for payment {}",
                subscription.payment_id
            )));
        }
        drop(state);
        self.subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn set_user_plan(&mut self, user_id: &UserId, plan_code: &PlanCode) -> Result<(), DomainError> {
        let state = self.state.read().await;
        state.check(FailurePoint::SetUserPlan)?;
        if !state.users.contains_key(user_id) {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("User not found: {}", user_id),
            ));
        }
        drop(state);
        self.user_plans.push((user_id.clone(), plan_code.clone()));
        Ok(())
    }

    async fn complete_order(
        &mut self,
        id: &OrderId,
        token: &ClaimToken,
        subscription_id: &SubscriptionId,
        gateway_response: Option<&str>,
        at: Timestamp,
    ) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        state.check(FailurePoint::CompleteOrder)?;
        if !state.holds_claim(id, token) {
            return Ok(false);
        }
        drop(state);
        self.completions.push(StagedCompletion {
            order_id: *id,
            token: *token,
            subscription_id: *subscription_id,
            gateway_response: gateway_response.map(str::to_string),
            at,
        });
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        let mut state = this.state.write().await;
        state.check(FailurePoint::Commit)?;

        // Validate everything before applying anything.
        for completion in &this.completions {
            if !state.holds_claim(&completion.order_id, &completion.token) {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Order {} is no longer claimable", completion.order_id),
                ));
            }
        }
        for (user_id, _) in &this.user_plans {
            if !state.users.contains_key(user_id) {
                return Err(DomainError::new(
                    ErrorCode::UserNotFound,
                    format!("User not found: {}", user_id),
                ));
            }
        }

        for completion in this.completions {
            if let Some(stored) = state.orders.get_mut(&completion.order_id) {
                stored.order.complete(
                    completion.subscription_id,
                    completion.gateway_response,
                    completion.at,
                )?;
                stored.claim = None;
            }
        }
        for (user_id, plan_code) in this.user_plans {
            state.users.insert(user_id, Some(plan_code));
        }
        state.subscriptions.extend(this.subscriptions);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}
