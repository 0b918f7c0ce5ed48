//! Signal evaluator abstraction
//!
//! Each evaluator answers one question about a work item ("does this look
//! like fraud?") from a single source. The aggregator combines the answers.

use async_trait::async_trait;
use fraudguard_core::{EvaluationError, EvaluatorKind, FileContent};
use std::fmt::Debug;

/// Trait that all signal evaluators implement
#[async_trait]
pub trait SignalEvaluator: Send + Sync + Debug {
    /// Which signal source this evaluator represents
    fn kind(&self) -> EvaluatorKind;

    /// Produce a verdict for the fetched content owned by `user_id`.
    ///
    /// Evaluators that do not need one of the inputs ignore it.
    async fn evaluate(&self, content: &FileContent, user_id: &str)
        -> Result<bool, EvaluationError>;
}
