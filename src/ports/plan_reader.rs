//! Plan reader port (read side).
//!
//! The plan table is maintained by the plan administration surface; checkout
//! only reads it.

use crate::domain::foundation::DomainError;
use crate::domain::plan::{Plan, PlanCode};
use async_trait::async_trait;

#[async_trait]
pub trait PlanReader: Send + Sync {
    /// Find a plan by code, active or not.
    ///
    /// Returns `None` if no plan has this code.
    async fn find_by_code(&self, code: &PlanCode) -> Result<Option<Plan>, DomainError>;

    /// List active plans ordered by `sort_order`.
    async fn list_active(&self) -> Result<Vec<Plan>, DomainError>;
}
