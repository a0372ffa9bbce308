//! PostgreSQL implementation of PlanReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::plan::{Plan, PlanCode};
use crate::ports::PlanReader;

pub struct PostgresPlanReader {
    pool: PgPool,
}

impl PostgresPlanReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    code: String,
    name: String,
    monthly_price: i64,
    quota_limit: Option<i32>,
    description: Option<String>,
    active: bool,
    sort_order: i32,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let quota_limit = row
            .quota_limit
            .map(u32::try_from)
            .transpose()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid quota_limit: {}", e))
            })?;

        Ok(Plan {
            code: PlanCode::new(row.code).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid plan code: {}", e))
            })?,
            name: row.name,
            monthly_price: row.monthly_price,
            quota_limit,
            description: row.description,
            active: row.active,
            sort_order: row.sort_order,
        })
    }
}

#[async_trait]
impl PlanReader for PostgresPlanReader {
    async fn find_by_code(&self, code: &PlanCode) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT code, name, monthly_price, quota_limit, description, active, sort_order
            FROM plans WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch plan: {}", e)))?;

        row.map(Plan::try_from).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Plan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT code, name, monthly_price, quota_limit, description, active, sort_order
            FROM plans WHERE active = TRUE
            ORDER BY sort_order, code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list plans: {}", e)))?;

        rows.into_iter().map(Plan::try_from).collect()
    }
}
