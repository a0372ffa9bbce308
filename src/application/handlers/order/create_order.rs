//! CreateOrderHandler - Command handler for starting a purchase.

use std::sync::Arc;

use crate::application::services::{NewOrder, OrderLedger};
use crate::domain::foundation::{TermId, UserId};
use crate::domain::order::{Order, OrderError, PaymentMethod};
use crate::domain::plan::PlanCode;

/// Command to create a Pending order for a plan.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub plan_code: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub agreed_term_ids: Vec<TermId>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: Order,
}

pub struct CreateOrderHandler {
    ledger: Arc<OrderLedger>,
}

impl CreateOrderHandler {
    pub fn new(ledger: Arc<OrderLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, OrderError> {
        let plan_code = PlanCode::new(cmd.plan_code)?;

        let order = self
            .ledger
            .create_order(NewOrder {
                user_id: cmd.user_id,
                plan_code,
                amount: cmd.amount,
                payment_method: cmd.payment_method,
                agreed_term_ids: cmd.agreed_term_ids,
            })
            .await?;

        Ok(CreateOrderResult { order })
    }
}
