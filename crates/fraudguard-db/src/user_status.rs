//! User fraud status repository: one row per user in `user_fraud_status`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fraudguard_core::UserFraudStatus;
use sqlx::{PgPool, Postgres};

use crate::traits::UserStatusStore;

/// Repository for the user_fraud_status table.
#[derive(Clone)]
pub struct UserStatusRepository {
    pool: PgPool,
}

impl UserStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(
        skip(self, status),
        fields(
            db.table = "user_fraud_status",
            user_id = %status.user_id,
            is_fraud = status.is_fraud
        )
    )]
    pub async fn upsert_status(&self, status: &UserFraudStatus) -> Result<(), sqlx::Error> {
        sqlx::query::<Postgres>(
            r#"
            INSERT INTO user_fraud_status (user_id, is_fraud, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET is_fraud = EXCLUDED.is_fraud, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&status.user_id)
        .bind(status.is_fraud)
        .bind(status.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStatusStore for UserStatusRepository {
    async fn upsert(&self, status: &UserFraudStatus) -> Result<()> {
        self.upsert_status(status)
            .await
            .context("Failed to upsert user fraud status")
    }
}
