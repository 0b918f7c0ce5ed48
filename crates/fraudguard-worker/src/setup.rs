//! Wiring: build the pipeline from configuration

use anyhow::{Context, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client as SqsClient;
use fraudguard_core::{Config, EndpointConfig};
use fraudguard_db::{
    setup_pool, FraudRecordRepository, PersistenceSink, StoreKind, UserStatusRepository,
};
use fraudguard_evaluators::{
    AiInferenceEvaluator, ContentHeuristicEvaluator, GuardedEvaluator, IdentityHistoryEvaluator,
    SignalEvaluator,
};
use fraudguard_storage::create_fetcher;
use std::sync::Arc;

use crate::aggregator::{EvaluatorSet, FraudAggregator};
use crate::driver::PipelineDriver;
use crate::publisher::SqsResultPublisher;

pub async fn sqs_client(config: &Config) -> SqsClient {
    let region_provider =
        RegionProviderChain::first_try(aws_config::Region::new(config.storage.region.clone()));
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    SqsClient::new(&sdk_config)
}

fn guarded(
    inner: Arc<dyn SignalEvaluator>,
    endpoint: &EndpointConfig,
) -> Arc<dyn SignalEvaluator> {
    let guard = GuardedEvaluator::new(inner, endpoint.failure_policy, endpoint.timeout());
    tracing::info!(
        evaluator = %guard.kind(),
        failure_policy = %guard.policy(),
        timeout_ms = guard.timeout().as_millis(),
        "Evaluator configured"
    );
    Arc::new(guard)
}

pub fn build_evaluators(config: &Config) -> Result<EvaluatorSet> {
    let http_client = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client for evaluators")?;

    let ai_inference = guarded(
        Arc::new(AiInferenceEvaluator::from_config(
            http_client.clone(),
            &config.inference,
        )),
        &config.inference,
    );
    let identity_history = guarded(
        Arc::new(IdentityHistoryEvaluator::from_config(
            http_client,
            &config.legacy,
        )),
        &config.legacy,
    );

    Ok(EvaluatorSet {
        ai_inference,
        identity_history,
        content_heuristic: Arc::new(ContentHeuristicEvaluator::new()),
    })
}

pub async fn build_sink(config: &Config) -> Result<PersistenceSink> {
    let record_pool = setup_pool(&config.database, StoreKind::FraudRecords).await?;
    let status_pool = setup_pool(&config.database, StoreKind::UserStatus).await?;

    Ok(PersistenceSink::new(
        Arc::new(FraudRecordRepository::new(record_pool)),
        Arc::new(UserStatusRepository::new(status_pool)),
    ))
}

/// Build the complete pipeline driver.
pub async fn build_driver(config: &Config, sqs: SqsClient) -> Result<Arc<PipelineDriver>> {
    let fetcher = create_fetcher(&config.storage)
        .await
        .context("Failed to initialize content fetcher")?;
    tracing::info!(backend = %fetcher.backend_type(), "Content fetcher initialized");

    let sink = build_sink(config).await?;
    let publisher = Arc::new(SqsResultPublisher::new(
        sqs,
        config.queue.outbound_queue_url.clone(),
    ));

    let aggregator = FraudAggregator::new(
        build_evaluators(config)?,
        config.worker.evaluation_mode,
        sink,
        publisher,
    );

    tracing::info!(evaluation_mode = %aggregator.mode(), "Fraud aggregator ready");

    Ok(Arc::new(PipelineDriver::new(fetcher, Arc::new(aggregator))))
}
