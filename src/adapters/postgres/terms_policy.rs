//! PostgreSQL implementation of TermsPolicy.
//!
//! Required payment terms are the active, required rows of the `payment`
//! category in the `terms` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, TermId};
use crate::ports::TermsPolicy;

const PAYMENT_TERMS_CATEGORY: &str = "payment";

pub struct PostgresTermsPolicy {
    pool: PgPool,
}

impl PostgresTermsPolicy {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TermsPolicy for PostgresTermsPolicy {
    async fn required_payment_terms(&self) -> Result<Vec<TermId>, DomainError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM terms
            WHERE category = $1 AND required = TRUE AND active = TRUE
            "#,
        )
        .bind(PAYMENT_TERMS_CATEGORY)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load payment terms: {}", e)))?;

        Ok(ids.into_iter().map(TermId::from_uuid).collect())
    }
}
