//! Store trait abstractions
//!
//! These traits are the narrow interface the pipeline needs from the two data
//! stores, so the aggregator stays independent of the storage technology and
//! can be tested with in-memory implementations.

use anyhow::Result;
use async_trait::async_trait;
use fraudguard_core::{FraudRecord, UserFraudStatus};

/// Document store holding one record per processed work item.
#[async_trait]
pub trait FraudRecordStore: Send + Sync {
    /// Append a record. Records are never updated in place.
    async fn store(&self, record: &FraudRecord) -> Result<()>;
}

/// Relational store holding the fraud flag per user.
#[async_trait]
pub trait UserStatusStore: Send + Sync {
    /// Insert or replace the status row for `status.user_id`.
    async fn upsert(&self, status: &UserFraudStatus) -> Result<()>;
}
