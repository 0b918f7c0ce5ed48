//! Scripted evaluators for tests

use async_trait::async_trait;
use fraudguard_core::{EvaluationError, EvaluatorKind, FileContent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::evaluator::SignalEvaluator;

/// Always returns the same verdict and counts its invocations.
#[derive(Debug)]
pub struct StaticEvaluator {
    kind: EvaluatorKind,
    verdict: bool,
    calls: AtomicUsize,
}

impl StaticEvaluator {
    pub fn new(kind: EvaluatorKind, verdict: bool) -> Self {
        Self {
            kind,
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalEvaluator for StaticEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(
        &self,
        _content: &FileContent,
        _user_id: &str,
    ) -> Result<bool, EvaluationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict)
    }
}

/// Always fails with a fixed error shape.
#[derive(Debug)]
pub struct FailingEvaluator {
    kind: EvaluatorKind,
    status: Option<u16>,
}

impl FailingEvaluator {
    pub fn inference(status: u16) -> Self {
        Self {
            kind: EvaluatorKind::AiInference,
            status: Some(status),
        }
    }

    pub fn legacy() -> Self {
        Self {
            kind: EvaluatorKind::IdentityHistory,
            status: None,
        }
    }
}

#[async_trait]
impl SignalEvaluator for FailingEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(
        &self,
        _content: &FileContent,
        _user_id: &str,
    ) -> Result<bool, EvaluationError> {
        match self.kind {
            EvaluatorKind::IdentityHistory => Err(EvaluationError::LegacyCall(
                "connection refused".to_string(),
            )),
            _ => Err(EvaluationError::Inference {
                status: self.status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// Sleeps before answering `false`; used to exercise timeouts.
#[derive(Debug)]
pub struct SlowEvaluator {
    kind: EvaluatorKind,
    delay: Duration,
}

impl SlowEvaluator {
    pub fn new(kind: EvaluatorKind, delay: Duration) -> Self {
        Self { kind, delay }
    }
}

#[async_trait]
impl SignalEvaluator for SlowEvaluator {
    fn kind(&self) -> EvaluatorKind {
        self.kind
    }

    async fn evaluate(
        &self,
        _content: &FileContent,
        _user_id: &str,
    ) -> Result<bool, EvaluationError> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }
}
