//! Pipeline driver: one inbound message through fetch, aggregation and side effects
//!
//! The driver never retries and never decides what happens to the message
//! afterwards. It reports either a [`PipelineReport`] or a [`StageFailure`]
//! naming the last stage reached, and the consumer picks the disposition.

use fraudguard_core::{PipelineError, VerdictSet, WorkItem};
use fraudguard_storage::ContentFetcher;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Instant;

use crate::aggregator::FraudAggregator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    LocatorResolved,
    ContentFetched,
    Aggregated,
    Done,
    Failed,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::LocatorResolved => "locator_resolved",
            PipelineStage::ContentFetched => "content_fetched",
            PipelineStage::Aggregated => "aggregated",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Successful pass.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub item: WorkItem,
    pub verdicts: VerdictSet,
    pub stage: PipelineStage,
}

impl PipelineReport {
    /// Summary printed by the `process` command.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "userId": self.item.user_id,
            "bucket": self.item.locator.bucket,
            "key": self.item.locator.key,
            "verdicts": self.verdicts,
            "isFraud": self.verdicts.is_fraud(),
            "stage": self.stage,
        })
    }
}

/// Failed pass: the last stage that completed and the error that stopped it.
#[derive(Debug, thiserror::Error)]
#[error("pipeline failed after stage '{stage}': {error}")]
pub struct StageFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: PipelineError,
}

impl StageFailure {
    fn new(stage: PipelineStage, error: PipelineError) -> Self {
        Self { stage, error }
    }
}

pub struct PipelineDriver {
    fetcher: Arc<dyn ContentFetcher>,
    aggregator: Arc<FraudAggregator>,
}

impl PipelineDriver {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, aggregator: Arc<FraudAggregator>) -> Self {
        Self {
            fetcher,
            aggregator,
        }
    }

    /// Process one inbound message body.
    #[tracing::instrument(skip(self, body))]
    pub async fn process_message(&self, body: &str) -> Result<PipelineReport, StageFailure> {
        let start = Instant::now();
        let result = self.run_stages(body).await;

        match &result {
            Ok(report) => tracing::info!(
                user_id = %report.item.user_id,
                is_fraud = report.verdicts.is_fraud(),
                duration_ms = start.elapsed().as_millis(),
                "Work item processed"
            ),
            Err(failure) => tracing::error!(
                stage = %PipelineStage::Failed,
                last_stage = %failure.stage,
                error_code = failure.error.error_code(),
                error = %failure.error,
                duration_ms = start.elapsed().as_millis(),
                "Work item failed"
            ),
        }

        result
    }

    async fn run_stages(&self, body: &str) -> Result<PipelineReport, StageFailure> {
        let mut stage = PipelineStage::Received;
        tracing::debug!(stage = %stage, "Message received");

        let item = WorkItem::from_message(body).map_err(|e| StageFailure::new(stage, e))?;
        stage = PipelineStage::LocatorResolved;
        tracing::debug!(
            stage = %stage,
            user_id = %item.user_id,
            locator = %item.locator,
            "Locator resolved"
        );

        let content = self.fetcher.fetch(&item.locator).await.map_err(|e| {
            StageFailure::new(
                stage,
                PipelineError::Retrieval {
                    locator: item.locator.to_string(),
                    message: e.to_string(),
                },
            )
        })?;
        stage = PipelineStage::ContentFetched;
        tracing::debug!(stage = %stage, size_bytes = content.len(), "Content fetched");

        let verdicts = self
            .aggregator
            .evaluate(&item, &content)
            .await
            .map_err(|e| StageFailure::new(stage, e))?;
        stage = PipelineStage::Aggregated;
        tracing::debug!(stage = %stage, is_fraud = verdicts.is_fraud(), "Verdicts ready");

        self.aggregator
            .record_outcome(&item, &content, &verdicts)
            .await
            .map_err(|e| StageFailure::new(stage, e))?;
        stage = PipelineStage::Done;
        tracing::debug!(stage = %stage, "Outcome recorded and published");

        Ok(PipelineReport {
            item,
            verdicts,
            stage,
        })
    }
}
