//! Persistence sink: the two writes the aggregator performs per work item.
//!
//! The writes are independent (no transaction spans both). A failure of either
//! is reported as `PipelineError::Persistence` naming the store.

use fraudguard_core::{FraudRecord, PipelineError, UserFraudStatus};
use std::sync::Arc;
use std::time::Instant;

use crate::traits::{FraudRecordStore, UserStatusStore};

pub const FRAUD_RECORD_STORE: &str = "fraud_records";
pub const USER_STATUS_STORE: &str = "user_fraud_status";

#[derive(Clone)]
pub struct PersistenceSink {
    records: Arc<dyn FraudRecordStore>,
    statuses: Arc<dyn UserStatusStore>,
}

impl PersistenceSink {
    pub fn new(records: Arc<dyn FraudRecordStore>, statuses: Arc<dyn UserStatusStore>) -> Self {
        Self { records, statuses }
    }

    /// Append the metadata + verdict record.
    pub async fn write_record(&self, record: &FraudRecord) -> Result<(), PipelineError> {
        let start = Instant::now();
        self.records.store(record).await.map_err(|e| {
            tracing::error!(
                error = %e,
                user_id = %record.user_id,
                record_id = %record.id,
                "Fraud record write failed"
            );
            PipelineError::Persistence {
                store: FRAUD_RECORD_STORE,
                source: e,
            }
        })?;

        tracing::debug!(
            user_id = %record.user_id,
            record_id = %record.id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fraud record stored"
        );
        Ok(())
    }

    /// Insert or replace the user's fraud status row.
    pub async fn write_status(&self, status: &UserFraudStatus) -> Result<(), PipelineError> {
        self.statuses.upsert(status).await.map_err(|e| {
            tracing::error!(
                error = %e,
                user_id = %status.user_id,
                "User fraud status write failed"
            );
            PipelineError::Persistence {
                store: USER_STATUS_STORE,
                source: e,
            }
        })?;

        tracing::info!(
            user_id = %status.user_id,
            is_fraud = status.is_fraud,
            "User fraud status updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use fraudguard_core::{FileContent, StorageLocator, VerdictSet, WorkItem};
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryRecords {
        records: Mutex<Vec<FraudRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl FraudRecordStore for InMemoryRecords {
        async fn store(&self, record: &FraudRecord) -> Result<()> {
            if self.fail {
                return Err(anyhow::anyhow!("document store unavailable"));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryStatuses {
        rows: Mutex<Vec<UserFraudStatus>>,
    }

    #[async_trait]
    impl UserStatusStore for InMemoryStatuses {
        async fn upsert(&self, status: &UserFraudStatus) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            rows.retain(|r| r.user_id != status.user_id);
            rows.push(status.clone());
            Ok(())
        }
    }

    fn record() -> FraudRecord {
        let item = WorkItem::new(StorageLocator::new("b", "k"), "test-user");
        let content = FileContent::new(&b"test-content"[..], None);
        FraudRecord::new(&item, &content, VerdictSet::new(true, false, false))
    }

    #[tokio::test]
    async fn test_write_record() {
        let records = Arc::new(InMemoryRecords::default());
        let sink = PersistenceSink::new(records.clone(), Arc::new(InMemoryStatuses::default()));

        let record = record();
        sink.write_record(&record).await.unwrap();

        let stored = records.records.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], record);
    }

    #[tokio::test]
    async fn test_write_record_failure_names_store() {
        let records = Arc::new(InMemoryRecords {
            fail: true,
            ..Default::default()
        });
        let sink = PersistenceSink::new(records, Arc::new(InMemoryStatuses::default()));

        let err = sink.write_record(&record()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Persistence {
                store: FRAUD_RECORD_STORE,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_write_status_last_write_wins() {
        let statuses = Arc::new(InMemoryStatuses::default());
        let sink = PersistenceSink::new(Arc::new(InMemoryRecords::default()), statuses.clone());

        sink.write_status(&UserFraudStatus::flagged("u1")).await.unwrap();
        sink.write_status(&UserFraudStatus::flagged("u1")).await.unwrap();
        sink.write_status(&UserFraudStatus::flagged("u2")).await.unwrap();

        assert_eq!(statuses.rows.lock().unwrap().len(), 2);
    }
}
