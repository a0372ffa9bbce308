//! ListPlansHandler - Query handler for the public plan list.

use std::sync::Arc;

use crate::application::services::PlanCatalog;
use crate::domain::order::OrderError;
use crate::domain::plan::Plan;

#[derive(Debug, Clone, Default)]
pub struct ListPlansQuery;

pub struct ListPlansHandler {
    catalog: Arc<PlanCatalog>,
}

impl ListPlansHandler {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, _query: ListPlansQuery) -> Result<Vec<Plan>, OrderError> {
        self.catalog.list_active().await
    }
}
