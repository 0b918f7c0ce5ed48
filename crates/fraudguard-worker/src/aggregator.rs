//! Fraud aggregator: fan out to the three evaluators, combine, persist, publish

use fraudguard_core::{
    EvaluationMode, FileContent, FraudRecord, NotificationMessage, PipelineError,
    UserFraudStatus, VerdictSet, WorkItem,
};
use fraudguard_db::PersistenceSink;
use fraudguard_evaluators::SignalEvaluator;
use std::sync::Arc;
use std::time::Instant;

use crate::publisher::ResultPublisher;

/// The three signal sources, one per verdict field.
#[derive(Debug, Clone)]
pub struct EvaluatorSet {
    pub ai_inference: Arc<dyn SignalEvaluator>,
    pub identity_history: Arc<dyn SignalEvaluator>,
    pub content_heuristic: Arc<dyn SignalEvaluator>,
}

pub struct FraudAggregator {
    evaluators: EvaluatorSet,
    mode: EvaluationMode,
    sink: PersistenceSink,
    publisher: Arc<dyn ResultPublisher>,
}

impl FraudAggregator {
    pub fn new(
        evaluators: EvaluatorSet,
        mode: EvaluationMode,
        sink: PersistenceSink,
        publisher: Arc<dyn ResultPublisher>,
    ) -> Self {
        Self {
            evaluators,
            mode,
            sink,
            publisher,
        }
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Evaluate, then persist and publish the outcome.
    ///
    /// Side effects run strictly in order: fraud record, user status (only
    /// when flagged), notification. The first failure stops the sequence.
    #[tracing::instrument(
        skip(self, item, content),
        fields(user_id = %item.user_id, locator = %item.locator)
    )]
    pub async fn detect_fraud(
        &self,
        item: &WorkItem,
        content: &FileContent,
    ) -> Result<VerdictSet, PipelineError> {
        let verdicts = self.evaluate(item, content).await?;
        self.record_outcome(item, content, &verdicts).await?;
        Ok(verdicts)
    }

    /// Run the three evaluators and combine their answers.
    ///
    /// A propagated evaluator error aborts with nothing persisted. In
    /// concurrent mode it also drops the evaluators still in flight.
    pub async fn evaluate(
        &self,
        item: &WorkItem,
        content: &FileContent,
    ) -> Result<VerdictSet, PipelineError> {
        let start = Instant::now();
        let user_id = item.user_id.as_str();
        let set = &self.evaluators;

        let (ai_fraud, legacy_fraud, content_fraud) = match self.mode {
            EvaluationMode::Concurrent => tokio::try_join!(
                run_evaluator(set.ai_inference.as_ref(), content, user_id),
                run_evaluator(set.identity_history.as_ref(), content, user_id),
                run_evaluator(set.content_heuristic.as_ref(), content, user_id),
            )?,
            EvaluationMode::Sequential => (
                run_evaluator(set.ai_inference.as_ref(), content, user_id).await?,
                run_evaluator(set.identity_history.as_ref(), content, user_id).await?,
                run_evaluator(set.content_heuristic.as_ref(), content, user_id).await?,
            ),
        };

        let verdicts = VerdictSet::new(ai_fraud, legacy_fraud, content_fraud);
        tracing::info!(
            user_id = %user_id,
            ai_fraud,
            legacy_fraud,
            content_fraud,
            is_fraud = verdicts.is_fraud(),
            mode = %self.mode,
            duration_ms = start.elapsed().as_millis(),
            "Verdicts aggregated"
        );
        Ok(verdicts)
    }

    /// Persist the verdicts and publish the notification.
    pub async fn record_outcome(
        &self,
        item: &WorkItem,
        content: &FileContent,
        verdicts: &VerdictSet,
    ) -> Result<(), PipelineError> {
        let record = FraudRecord::new(item, content, *verdicts);
        self.sink.write_record(&record).await?;

        if verdicts.is_fraud() {
            self.sink
                .write_status(&UserFraudStatus::flagged(item.user_id.as_str()))
                .await?;
        }

        let notification = NotificationMessage::new(item.user_id.as_str(), verdicts);
        self.publisher
            .publish(&notification)
            .await
            .map_err(PipelineError::Publish)?;

        Ok(())
    }
}

async fn run_evaluator(
    evaluator: &dyn SignalEvaluator,
    content: &FileContent,
    user_id: &str,
) -> Result<bool, PipelineError> {
    evaluator
        .evaluate(content, user_id)
        .await
        .map_err(|source| PipelineError::AggregationAbort {
            evaluator: evaluator.kind(),
            source,
        })
}
