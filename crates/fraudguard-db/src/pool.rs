//! Connection pools and migrations for the two stores

use anyhow::{Context, Result};
use fraudguard_core::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Which store a pool backs; selects the migration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    FraudRecords,
    UserStatus,
}

impl StoreKind {
    fn migrator(&self) -> Migrator {
        let mut migrator = match self {
            StoreKind::FraudRecords => sqlx::migrate!("./migrations/fraud_records"),
            StoreKind::UserStatus => sqlx::migrate!("./migrations/user_status"),
        };
        // Both stores may share one database and therefore one migrations table.
        migrator.set_ignore_missing(true);
        migrator
    }

    fn url<'a>(&self, config: &'a DatabaseConfig) -> &'a str {
        match self {
            StoreKind::FraudRecords => &config.fraud_record_url,
            StoreKind::UserStatus => &config.user_status_url,
        }
    }
}

/// Connect a pool for `kind` and apply its pending migrations.
pub async fn setup_pool(config: &DatabaseConfig, kind: StoreKind) -> Result<PgPool> {
    tracing::info!(store = ?kind, "Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(kind.url(config))
        .await
        .with_context(|| format!("Failed to connect to {:?} database", kind))?;

    tracing::info!(
        store = ?kind,
        max_connections = config.max_connections,
        "Database connected successfully"
    );

    kind.migrator()
        .run(&pool)
        .await
        .with_context(|| format!("Failed to run {:?} migrations", kind))?;
    tracing::info!(store = ?kind, "Database migrations applied");

    Ok(pool)
}
