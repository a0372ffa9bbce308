//! PlanCatalog - read-only lookup of sellable plans.

use std::sync::Arc;

use crate::domain::order::OrderError;
use crate::domain::plan::{Plan, PlanCode};
use crate::ports::PlanReader;

pub struct PlanCatalog {
    plans: Arc<dyn PlanReader>,
}

impl PlanCatalog {
    pub fn new(plans: Arc<dyn PlanReader>) -> Self {
        Self { plans }
    }

    /// Resolve a plan for purchase at `requested_amount`.
    ///
    /// Checks run in this order: unknown, inactive, price mismatch, free.
    pub async fn resolve(&self, code: &PlanCode, requested_amount: i64) -> Result<Plan, OrderError> {
        let plan = self
            .plans
            .find_by_code(code)
            .await?
            .ok_or_else(|| OrderError::unknown_plan(code.as_str()))?;

        if !plan.active {
            return Err(OrderError::inactive_plan(code.as_str()));
        }
        if plan.monthly_price != requested_amount {
            return Err(OrderError::price_mismatch(plan.monthly_price, requested_amount));
        }
        if plan.is_free() {
            return Err(OrderError::not_payable(code.as_str()));
        }

        Ok(plan)
    }

    /// Look up a plan regardless of its active flag.
    pub async fn find(&self, code: &PlanCode) -> Result<Option<Plan>, OrderError> {
        Ok(self.plans.find_by_code(code).await?)
    }

    /// Active plans ordered by sort order.
    pub async fn list_active(&self) -> Result<Vec<Plan>, OrderError> {
        Ok(self.plans.list_active().await?)
    }
}
