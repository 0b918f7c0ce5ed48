//! Timeout and failure-policy guard around a remote evaluator

use async_trait::async_trait;
use fraudguard_core::{EvaluationError, EvaluatorKind, FailurePolicy, FileContent};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::evaluator::SignalEvaluator;

/// Wraps an evaluator with a bounded timeout and a failure policy.
///
/// A timeout is treated exactly like an error from the inner evaluator.
/// Under `FailOpen` the error is logged and the verdict becomes `false`;
/// under `FailClosed` it is returned to the caller.
#[derive(Debug, Clone)]
pub struct GuardedEvaluator {
    inner: Arc<dyn SignalEvaluator>,
    policy: FailurePolicy,
    timeout: Duration,
}

impl GuardedEvaluator {
    pub fn new(inner: Arc<dyn SignalEvaluator>, policy: FailurePolicy, timeout: Duration) -> Self {
        Self {
            inner,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn evaluate_bounded(
        &self,
        content: &FileContent,
        user_id: &str,
    ) -> Result<bool, EvaluationError> {
        match tokio::time::timeout(self.timeout, self.inner.evaluate(content, user_id)).await {
            Ok(result) => result,
            Err(_) => Err(EvaluationError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl SignalEvaluator for GuardedEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.inner.kind()
    }

    async fn evaluate(
        &self,
        content: &FileContent,
        user_id: &str,
    ) -> Result<bool, EvaluationError> {
        let start = Instant::now();
        let evaluator = self.inner.kind();

        match self.evaluate_bounded(content, user_id).await {
            Ok(verdict) => {
                tracing::debug!(
                    evaluator = %evaluator,
                    verdict,
                    duration_ms = start.elapsed().as_millis(),
                    "Evaluator completed"
                );
                Ok(verdict)
            }
            Err(e) => match self.policy {
                FailurePolicy::FailOpen => {
                    tracing::warn!(
                        evaluator = %evaluator,
                        user_id = %user_id,
                        error = %e,
                        duration_ms = start.elapsed().as_millis(),
                        "Evaluator failed, continuing with verdict=false (fail-open)"
                    );
                    Ok(false)
                }
                FailurePolicy::FailClosed => {
                    tracing::error!(
                        evaluator = %evaluator,
                        user_id = %user_id,
                        error = %e,
                        duration_ms = start.elapsed().as_millis(),
                        "Evaluator failed (fail-closed)"
                    );
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingEvaluator, SlowEvaluator, StaticEvaluator};

    fn content() -> FileContent {
        FileContent::new(&b"test-content"[..], None)
    }

    #[tokio::test]
    async fn test_passes_through_verdict() {
        let guard = GuardedEvaluator::new(
            Arc::new(StaticEvaluator::new(EvaluatorKind::AiInference, true)),
            FailurePolicy::FailClosed,
            Duration::from_secs(1),
        );

        assert!(guard.evaluate(&content(), "u1").await.unwrap());
        assert_eq!(guard.kind(), EvaluatorKind::AiInference);
        assert_eq!(guard.policy(), FailurePolicy::FailClosed);
        assert_eq!(guard.timeout(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_fail_open_coerces_error_to_false() {
        let guard = GuardedEvaluator::new(
            Arc::new(FailingEvaluator::legacy()),
            FailurePolicy::FailOpen,
            Duration::from_secs(1),
        );

        assert!(!guard.evaluate(&content(), "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_closed_propagates_error() {
        let guard = GuardedEvaluator::new(
            Arc::new(FailingEvaluator::inference(503)),
            FailurePolicy::FailClosed,
            Duration::from_secs(1),
        );

        let err = guard.evaluate(&content(), "u1").await.unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Inference {
                status: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_an_error_under_fail_closed() {
        let guard = GuardedEvaluator::new(
            Arc::new(SlowEvaluator::new(
                EvaluatorKind::AiInference,
                Duration::from_secs(5),
            )),
            FailurePolicy::FailClosed,
            Duration::from_millis(50),
        );

        let err = guard.evaluate(&content(), "u1").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Timeout { timeout_ms: 50 }));
    }

    #[tokio::test]
    async fn test_timeout_is_false_under_fail_open() {
        let guard = GuardedEvaluator::new(
            Arc::new(SlowEvaluator::new(
                EvaluatorKind::IdentityHistory,
                Duration::from_secs(5),
            )),
            FailurePolicy::FailOpen,
            Duration::from_millis(50),
        );

        assert!(!guard.evaluate(&content(), "u1").await.unwrap());
    }
}
