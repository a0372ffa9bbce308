//! PostgreSQL implementation of OrderRepository.
//!
//! The confirmation claim lives in the `claim_token` / `claim_expires_at`
//! columns. Claiming and the terminal Failed write are single conditional
//! UPDATEs, so two processes racing on one order are serialized by the row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    ClaimToken, DomainError, ErrorCode, OrderId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::order::{ConfirmationClaim, Order, OrderStatus, PaymentMethod, TransactionRef};
use crate::domain::plan::PlanCode;
use crate::ports::OrderRepository;

/// PostgreSQL implementation of the OrderRepository port.
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: String,
    plan_code: String,
    amount: i64,
    payment_method: String,
    status: String,
    gateway_provider: String,
    transaction_ref: String,
    gateway_response: Option<String>,
    subscription_id: Option<Uuid>,
    reconciliation_required: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

const ORDER_COLUMNS: &str = r#"
    id, user_id, plan_code, amount, payment_method, status, gateway_provider,
    transaction_ref, gateway_response, subscription_id, reconciliation_required,
    created_at, updated_at, completed_at, cancelled_at
"#;

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: OrderId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(corrupt("user_id"))?,
            plan_code: PlanCode::new(row.plan_code).map_err(corrupt("plan_code"))?,
            amount: row.amount,
            payment_method: parse_payment_method(&row.payment_method)?,
            status: parse_status(&row.status)?,
            gateway_provider: row.gateway_provider,
            transaction_ref: TransactionRef::new(row.transaction_ref)
                .map_err(corrupt("transaction_ref"))?,
            gateway_response: row.gateway_response,
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            reconciliation_required: row.reconciliation_required,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
        })
    }
}

fn corrupt<E: std::fmt::Display>(column: &'static str) -> impl Fn(E) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid {}: {}", column, e))
}

fn parse_status(s: &str) -> Result<OrderStatus, DomainError> {
    match s {
        "pending" => Ok(OrderStatus::Pending),
        "completed" => Ok(OrderStatus::Completed),
        "failed" => Ok(OrderStatus::Failed),
        "cancelled" => Ok(OrderStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid order status value: {}", s),
        )),
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod, DomainError> {
    match s {
        "card" => Ok(PaymentMethod::Card),
        "bank_transfer" => Ok(PaymentMethod::BankTransfer),
        "virtual_account" => Ok(PaymentMethod::VirtualAccount),
        "mobile_phone" => Ok(PaymentMethod::MobilePhone),
        "easy_pay" => Ok(PaymentMethod::EasyPay),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment method value: {}", s),
        )),
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, plan_code, amount, payment_method, status, gateway_provider,
                transaction_ref, gateway_response, subscription_id, reconciliation_required,
                created_at, updated_at, completed_at, cancelled_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(order.plan_code.as_str())
        .bind(order.amount)
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(&order.gateway_provider)
        .bind(order.transaction_ref.as_str())
        .bind(&order.gateway_response)
        .bind(order.subscription_id.map(|id| *id.as_uuid()))
        .bind(order.reconciliation_required)
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .bind(order.completed_at.map(|t| *t.as_datetime()))
        .bind(order.cancelled_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save order: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to fetch order: {}", e)))?;

        row.map(Order::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, DomainError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list orders: {}", e)))?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn try_claim(
        &self,
        id: &OrderId,
        claim: &ConfirmationClaim,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                claim_token = $2,
                claim_expires_at = $3
            WHERE id = $1
              AND status = 'pending'
              AND reconciliation_required = FALSE
              AND (claim_token IS NULL OR claim_expires_at <= $4)
            "#,
        )
        .bind(id.as_uuid())
        .bind(claim.token.as_uuid())
        .bind(claim.expires_at.as_datetime())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to claim order: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_claim(&self, id: &OrderId, token: &ClaimToken) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE orders SET claim_token = NULL, claim_expires_at = NULL
            WHERE id = $1 AND claim_token = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(token.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to release claim: {}", e)))?;

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: &OrderId,
        token: &ClaimToken,
        gateway_response: Option<&str>,
        at: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'failed',
                gateway_response = $3,
                updated_at = $4,
                claim_token = NULL,
                claim_expires_at = NULL
            WHERE id = $1 AND status = 'pending' AND claim_token = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(token.as_uuid())
        .bind(gateway_response)
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark order failed: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn flag_for_reconciliation(&self, id: &OrderId, at: Timestamp) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET reconciliation_required = TRUE, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to flag order: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order not found: {}", id),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_stored_status() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Failed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_a_database_error() {
        let err = parse_status("refunded").unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn parses_every_stored_payment_method() {
        for method in [
            PaymentMethod::Card,
            PaymentMethod::BankTransfer,
            PaymentMethod::VirtualAccount,
            PaymentMethod::MobilePhone,
            PaymentMethod::EasyPay,
        ] {
            assert_eq!(parse_payment_method(method.as_str()).unwrap(), method);
        }
    }

    #[test]
    fn row_with_blank_user_is_rejected() {
        let now = Utc::now();
        let row = OrderRow {
            id: Uuid::new_v4(),
            user_id: String::new(),
            plan_code: "pro".to_string(),
            amount: 9900,
            payment_method: "card".to_string(),
            status: "pending".to_string(),
            gateway_provider: "mock".to_string(),
            transaction_ref: "TXN_1".to_string(),
            gateway_response: None,
            subscription_id: None,
            reconciliation_required: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
        };

        assert!(Order::try_from(row).is_err());
    }
}
