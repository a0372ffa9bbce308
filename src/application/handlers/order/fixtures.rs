//! Shared wiring for order handler tests.

use std::sync::Arc;

use crate::adapters::gateway::MockPaymentGateway;
use crate::adapters::memory::InMemoryCommerceStore;
use crate::application::services::{EntitlementProvisioner, NewOrder, OrderLedger, PlanCatalog};
use crate::domain::foundation::{AuthenticatedUser, Timestamp, UserId};
use crate::domain::order::{ConfirmationClaim, Order, PaymentMethod};
use crate::domain::plan::{Plan, PlanCode};
use crate::ports::OrderRepository;

use super::{AdministrativeOverride, ConfirmationOrchestrator};

pub(super) struct Fixture {
    pub store: InMemoryCommerceStore,
    pub gateway: MockPaymentGateway,
    pub user: UserId,
}

impl Fixture {
    /// Store with plan `pro` at 9900 and a registered `user-1`.
    pub async fn new() -> Self {
        let store = InMemoryCommerceStore::new();
        store
            .add_plan(Plan {
                code: PlanCode::new("pro").unwrap(),
                name: "Pro".to_string(),
                monthly_price: 9900,
                quota_limit: Some(100),
                description: Some("For regular use".to_string()),
                active: true,
                sort_order: 2,
            })
            .await;
        let user = UserId::new("user-1").unwrap();
        store.add_user(user.clone()).await;

        Self {
            store,
            gateway: MockPaymentGateway::new(),
            user,
        }
    }

    pub fn catalog(&self) -> Arc<PlanCatalog> {
        Arc::new(PlanCatalog::new(Arc::new(self.store.clone())))
    }

    pub fn ledger(&self) -> Arc<OrderLedger> {
        let store = Arc::new(self.store.clone());
        Arc::new(OrderLedger::new(
            store.clone(),
            self.catalog(),
            store,
            "mock",
        ))
    }

    pub fn orchestrator(&self) -> ConfirmationOrchestrator {
        ConfirmationOrchestrator::new(
            self.catalog(),
            self.ledger(),
            Arc::new(EntitlementProvisioner::new()),
            Arc::new(self.gateway.clone()),
            Arc::new(self.store.clone()),
        )
    }

    pub async fn pending_order(&self) -> Order {
        self.pending_order_for(&self.user.clone()).await
    }

    pub async fn pending_order_for(&self, user: &UserId) -> Order {
        self.ledger()
            .create_order(NewOrder {
                user_id: user.clone(),
                plan_code: PlanCode::new("pro").unwrap(),
                amount: 9900,
                payment_method: PaymentMethod::Card,
                agreed_term_ids: vec![],
            })
            .await
            .unwrap()
    }

    /// Plant a claim as if another process held it.
    pub async fn store_claim(&self, order: &Order, claim: &ConfirmationClaim) {
        assert!(self
            .store
            .try_claim(&order.id, claim, Timestamp::now())
            .await
            .unwrap());
    }

    pub fn admin_grant(&self) -> AdministrativeOverride {
        let admin = AuthenticatedUser::new(UserId::new("admin-1").unwrap(), None).with_role("admin");
        AdministrativeOverride::authorize(&admin).unwrap()
    }
}
