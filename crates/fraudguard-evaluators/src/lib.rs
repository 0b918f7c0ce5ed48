//! Fraudguard Evaluators
//!
//! The three signal sources behind a fraud verdict, behind one
//! [`SignalEvaluator`] trait:
//!
//! - [`AiInferenceEvaluator`]: remote model endpoint, content as base64
//! - [`IdentityHistoryEvaluator`]: remote legacy system, keyed by user id
//! - [`ContentHeuristicEvaluator`]: local substring scan
//!
//! Remote evaluators are wrapped in a [`GuardedEvaluator`] that bounds their
//! latency and applies a [`fraudguard_core::FailurePolicy`].

pub mod ai_inference;
pub mod content_heuristic;
pub mod evaluator;
pub mod guard;
pub mod identity_history;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use ai_inference::AiInferenceEvaluator;
pub use content_heuristic::{ContentHeuristicEvaluator, SUSPICIOUS_TOKENS};
pub use evaluator::SignalEvaluator;
pub use guard::GuardedEvaluator;
pub use identity_history::IdentityHistoryEvaluator;
