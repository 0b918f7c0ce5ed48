//! Error taxonomy for the fraud evaluation pipeline
//!
//! `EvaluationError` is what a single signal evaluator can fail with.
//! `PipelineError` is what one pass of the pipeline can fail with; the
//! driver uses [`PipelineError::is_recoverable`] to pick a disposition for
//! the inbound message.

use crate::models::EvaluatorKind;

/// Failure of one signal evaluator.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// Inference endpoint unreachable or returned a non-success status.
    #[error("Inference call failed{}: {message}", status_suffix(.status))]
    Inference {
        status: Option<u16>,
        message: String,
    },

    /// Legacy identity system unreachable or returned a non-success status.
    #[error("Legacy system call failed: {0}")]
    LegacyCall(String),

    #[error("Evaluator timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" with status {}", s))
        .unwrap_or_default()
}

/// Failure of one pipeline pass for a single work item.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Retrieval failed for {locator}: {message}")]
    Retrieval { locator: String, message: String },

    /// A fail-closed evaluator errored; nothing was persisted or published.
    #[error("Aggregation aborted by {evaluator} evaluator: {source}")]
    AggregationAbort {
        evaluator: EvaluatorKind,
        #[source]
        source: EvaluationError,
    },

    #[error("Persistence write to {store} failed")]
    Persistence {
        store: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Publishing result notification failed")]
    Publish(#[source] anyhow::Error),
}

impl PipelineError {
    /// Whether reprocessing the same message could succeed.
    ///
    /// A malformed message will be malformed on every delivery.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PipelineError::MalformedMessage(_))
    }

    /// Short machine-readable code used in logs and dead-letter attributes.
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::MalformedMessage(_) => "MALFORMED_MESSAGE",
            PipelineError::Retrieval { .. } => "RETRIEVAL_ERROR",
            PipelineError::AggregationAbort { .. } => "AGGREGATION_ABORT",
            PipelineError::Persistence { .. } => "PERSISTENCE_ERROR",
            PipelineError::Publish(_) => "PUBLISH_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_message_with_status() {
        let err = EvaluationError::Inference {
            status: Some(503),
            message: "unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Inference call failed with status 503: unavailable"
        );
    }

    #[test]
    fn test_inference_error_message_without_status() {
        let err = EvaluationError::Inference {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Inference call failed: connection refused");
    }

    #[test]
    fn test_recoverability() {
        assert!(!PipelineError::MalformedMessage("x".into()).is_recoverable());
        assert!(PipelineError::Retrieval {
            locator: "b/k".into(),
            message: "not found".into()
        }
        .is_recoverable());
        assert!(PipelineError::AggregationAbort {
            evaluator: EvaluatorKind::AiInference,
            source: EvaluationError::Timeout { timeout_ms: 10 },
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        let err = PipelineError::Publish(anyhow::anyhow!("queue gone"));
        assert_eq!(err.error_code(), "PUBLISH_ERROR");
        let err = PipelineError::Persistence {
            store: "fraud_records",
            source: anyhow::anyhow!("connection reset"),
        };
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
        assert!(err.to_string().contains("fraud_records"));
    }
}
