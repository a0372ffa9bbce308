//! GetOrderHandler - Query handler for one of the caller's orders.

use std::sync::Arc;

use crate::application::services::OrderLedger;
use crate::domain::foundation::{OrderId, UserId};
use crate::domain::order::{Order, OrderError};

#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub user_id: UserId,
    pub order_id: OrderId,
}

pub type GetOrderResult = Order;

pub struct GetOrderHandler {
    ledger: Arc<OrderLedger>,
}

impl GetOrderHandler {
    pub fn new(ledger: Arc<OrderLedger>) -> Self {
        Self { ledger }
    }

    /// Returns the order if it belongs to the caller.
    pub async fn handle(&self, query: GetOrderQuery) -> Result<GetOrderResult, OrderError> {
        let order = self.ledger.get(&query.order_id).await?;
        if !order.is_owned_by(&query.user_id) {
            return Err(OrderError::Forbidden(order.id));
        }
        Ok(order)
    }
}
