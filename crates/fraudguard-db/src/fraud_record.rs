//! Fraud record repository: append-only JSONB documents in `fraud_records`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fraudguard_core::FraudRecord;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};

use crate::traits::FraudRecordStore;

/// Repository for the fraud_records table.
#[derive(Clone)]
pub struct FraudRecordRepository {
    pool: PgPool,
}

impl FraudRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one record as a JSONB document.
    #[tracing::instrument(
        skip(self, record),
        fields(
            db.table = "fraud_records",
            db.record_id = %record.id,
            user_id = %record.user_id
        )
    )]
    pub async fn insert(&self, record: &FraudRecord) -> Result<(), sqlx::Error> {
        sqlx::query::<Postgres>(
            r#"
            INSERT INTO fraud_records (id, user_id, document, is_fraud, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(Json(record))
        .bind(record.verdicts.is_fraud())
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FraudRecordStore for FraudRecordRepository {
    async fn store(&self, record: &FraudRecord) -> Result<()> {
        self.insert(record)
            .await
            .context("Failed to insert fraud record")
    }
}
