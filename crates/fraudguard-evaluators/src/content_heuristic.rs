//! Content heuristic evaluator: fixed substring scan over the bytes

use async_trait::async_trait;
use fraudguard_core::{EvaluationError, EvaluatorKind, FileContent};

use crate::evaluator::SignalEvaluator;

/// Tokens whose presence anywhere in the content flags it.
pub const SUSPICIOUS_TOKENS: [&str; 2] = ["fraud", "illegal"];

/// Pure local check. Bytes are decoded lossily so binary content is scanned
/// too; matching is case-sensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHeuristicEvaluator;

impl ContentHeuristicEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, bytes: &[u8]) -> bool {
        let text = String::from_utf8_lossy(bytes);
        SUSPICIOUS_TOKENS.iter().any(|token| text.contains(token))
    }
}

#[async_trait]
impl SignalEvaluator for ContentHeuristicEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::ContentHeuristic
    }

    async fn evaluate(
        &self,
        content: &FileContent,
        _user_id: &str,
    ) -> Result<bool, EvaluationError> {
        Ok(self.check(&content.bytes))
    }
}
