//! ListMyOrdersHandler - Query handler for the caller's order history.

use std::sync::Arc;

use crate::application::services::OrderLedger;
use crate::domain::foundation::UserId;
use crate::domain::order::{Order, OrderError};

#[derive(Debug, Clone)]
pub struct ListMyOrdersQuery {
    pub user_id: UserId,
}

pub struct ListMyOrdersHandler {
    ledger: Arc<OrderLedger>,
}

impl ListMyOrdersHandler {
    pub fn new(ledger: Arc<OrderLedger>) -> Self {
        Self { ledger }
    }

    /// Orders newest first.
    pub async fn handle(&self, query: ListMyOrdersQuery) -> Result<Vec<Order>, OrderError> {
        self.ledger.list_for_user(&query.user_id).await
    }
}
