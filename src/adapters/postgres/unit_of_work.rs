//! PostgreSQL unit of work.
//!
//! One `sqlx` transaction spanning the subscription insert, the user plan
//! update and the conditional order completion. Dropping an uncommitted unit
//! rolls the transaction back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{
    ClaimToken, DomainError, ErrorCode, OrderId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::plan::PlanCode;
use crate::domain::subscription::Subscription;
use crate::ports::{UnitOfWork, UnitOfWorkFactory};

pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        let tx = self.pool.begin().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to begin transaction: {}", e))
        })?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }
}

pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn insert_subscription(&mut self, subscription: &Subscription) -> Result<(), DomainError> {
        let quota_limit = subscription.quota_limit.map(to_db_int).transpose()?;
        let quota_used = to_db_int(subscription.quota_used)?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_type, status, quota_limit, quota_used, started_at,
                expires_at, payment_id, auto_renew, cancelled_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.plan_type.as_str())
        .bind(subscription.status.as_str())
        .bind(quota_limit)
        .bind(quota_used)
        .bind(subscription.started_at.as_datetime())
        .bind(subscription.expires_at.as_datetime())
        .bind(subscription.payment_id.as_uuid())
        .bind(subscription.auto_renew)
        .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_payment_id_key") {
                    return DomainError::database(format!(
                        "Subscription already exists for payment {}",
                        subscription.payment_id
                    ));
                }
            }
            DomainError::database(format!("Failed to insert subscription: {}", e))
        })?;

        Ok(())
    }

    async fn set_user_plan(&mut self, user_id: &UserId, plan_code: &PlanCode) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET current_plan = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(plan_code.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update user plan: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("User not found: {}", user_id),
            ));
        }

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
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'completed',
                subscription_id = $3,
                gateway_response = $4,
                completed_at = $5,
                updated_at = $5,
                claim_token = NULL,
                claim_expires_at = NULL
            WHERE id = $1 AND status = 'pending' AND claim_token = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(token.as_uuid())
        .bind(subscription_id.as_uuid())
        .bind(gateway_response)
        .bind(at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to complete order: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        this.tx.commit().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to commit transaction: {}", e))
        })
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        this.tx.rollback().await.map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to roll back transaction: {}", e))
        })
    }
}

fn to_db_int(value: u32) -> Result<i32, DomainError> {
    i32::try_from(value)
        .map_err(|_| DomainError::validation("quota", format!("{} exceeds the storable range", value)))
}
