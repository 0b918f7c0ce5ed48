//! Shared harness for pipeline tests: recording stores, publisher and fetcher.

#![allow(dead_code)]

use async_trait::async_trait;
use fraudguard_core::{
    EvaluationMode, FailurePolicy, FileContent, FraudRecord, NotificationMessage, StorageBackend,
    StorageLocator, UserFraudStatus,
};
use fraudguard_db::{FraudRecordStore, PersistenceSink, UserStatusStore};
use fraudguard_evaluators::{
    AiInferenceEvaluator, ContentHeuristicEvaluator, GuardedEvaluator, IdentityHistoryEvaluator,
    SignalEvaluator,
};
use fraudguard_storage::{ContentFetcher, StorageError, StorageResult};
use fraudguard_worker::{EvaluatorSet, FraudAggregator, PipelineDriver, ResultPublisher};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BUCKET: &str = "test-bucket";
pub const KEY: &str = "uploads/test-file.txt";
pub const USER_ID: &str = "test-user";

/// Shared ordered log of side effects across all recording mocks.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

#[derive(Default)]
pub struct RecordingRecordStore {
    pub records: Mutex<Vec<FraudRecord>>,
    pub fail: bool,
    pub log: CallLog,
}

#[async_trait]
impl FraudRecordStore for RecordingRecordStore {
    async fn store(&self, record: &FraudRecord) -> anyhow::Result<()> {
        self.log.lock().unwrap().push("store_record");
        if self.fail {
            anyhow::bail!("document store unavailable");
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingStatusStore {
    pub statuses: Mutex<Vec<UserFraudStatus>>,
    pub fail: bool,
    pub log: CallLog,
}

#[async_trait]
impl UserStatusStore for RecordingStatusStore {
    async fn upsert(&self, status: &UserFraudStatus) -> anyhow::Result<()> {
        self.log.lock().unwrap().push("upsert_status");
        if self.fail {
            anyhow::bail!("relational store unavailable");
        }
        self.statuses.lock().unwrap().push(status.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<NotificationMessage>>,
    pub fail: bool,
    pub log: CallLog,
}

#[async_trait]
impl ResultPublisher for RecordingPublisher {
    async fn publish(&self, notification: &NotificationMessage) -> anyhow::Result<()> {
        self.log.lock().unwrap().push("publish");
        if self.fail {
            anyhow::bail!("outbound queue unavailable");
        }
        self.published.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Serves objects from memory; anything else is `NotFound`.
#[derive(Default)]
pub struct InMemoryFetcher {
    objects: HashMap<(String, String), FileContent>,
}

impl InMemoryFetcher {
    pub fn with_object(mut self, bucket: &str, key: &str, data: &'static [u8]) -> Self {
        self.objects.insert(
            (bucket.to_string(), key.to_string()),
            FileContent::new(data, Some("text/plain".to_string())),
        );
        self
    }
}

#[async_trait]
impl ContentFetcher for InMemoryFetcher {
    async fn fetch(&self, locator: &StorageLocator) -> StorageResult<FileContent> {
        self.objects
            .get(&(locator.bucket.clone(), locator.key.clone()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(locator.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Which side-effect dependencies should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub record_store: bool,
    pub status_store: bool,
    pub publisher: bool,
}

pub struct Harness {
    pub records: Arc<RecordingRecordStore>,
    pub statuses: Arc<RecordingStatusStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub log: CallLog,
    pub aggregator: Arc<FraudAggregator>,
}

impl Harness {
    pub fn new(evaluators: EvaluatorSet, mode: EvaluationMode) -> Self {
        Self::with_failures(evaluators, mode, Failures::default())
    }

    pub fn with_failures(
        evaluators: EvaluatorSet,
        mode: EvaluationMode,
        failures: Failures,
    ) -> Self {
        let log = CallLog::default();
        let records = Arc::new(RecordingRecordStore {
            fail: failures.record_store,
            log: log.clone(),
            ..Default::default()
        });
        let statuses = Arc::new(RecordingStatusStore {
            fail: failures.status_store,
            log: log.clone(),
            ..Default::default()
        });
        let publisher = Arc::new(RecordingPublisher {
            fail: failures.publisher,
            log: log.clone(),
            ..Default::default()
        });

        let sink = PersistenceSink::new(records.clone(), statuses.clone());
        let aggregator = Arc::new(FraudAggregator::new(
            evaluators,
            mode,
            sink,
            publisher.clone(),
        ));

        Self {
            records,
            statuses,
            publisher,
            log,
            aggregator,
        }
    }

    pub fn driver(&self, fetcher: InMemoryFetcher) -> PipelineDriver {
        PipelineDriver::new(Arc::new(fetcher), self.aggregator.clone())
    }

    pub fn record_count(&self) -> usize {
        self.records.records.lock().unwrap().len()
    }

    pub fn status_count(&self) -> usize {
        self.statuses.statuses.lock().unwrap().len()
    }

    pub fn publish_count(&self) -> usize {
        self.publisher.published.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

/// Evaluators backed by mock HTTP servers, wired the way the binary wires them.
pub fn http_evaluators(
    inference: &mockito::Server,
    legacy: &mockito::Server,
    legacy_policy: FailurePolicy,
) -> EvaluatorSet {
    let http_client = reqwest::Client::new();
    let ai: Arc<dyn SignalEvaluator> = Arc::new(AiInferenceEvaluator::new(
        http_client.clone(),
        format!("{}/invocations", inference.url()),
        None,
    ));
    let history: Arc<dyn SignalEvaluator> =
        Arc::new(IdentityHistoryEvaluator::new(http_client, legacy.url(), None));

    EvaluatorSet {
        ai_inference: Arc::new(GuardedEvaluator::new(
            ai,
            FailurePolicy::FailClosed,
            Duration::from_secs(5),
        )),
        identity_history: Arc::new(GuardedEvaluator::new(
            history,
            legacy_policy,
            Duration::from_secs(5),
        )),
        content_heuristic: Arc::new(ContentHeuristicEvaluator::new()),
    }
}

pub fn message(bucket: &str, key: &str, user_id: &str) -> String {
    serde_json::json!({ "bucket": bucket, "key": key, "userId": user_id }).to_string()
}
