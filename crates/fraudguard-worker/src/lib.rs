//! Fraudguard Worker
//!
//! The fraud evaluation pipeline end to end: the [`FraudAggregator`] combining
//! the three evaluators, the [`PipelineDriver`] taking one inbound message to a
//! verdict, the outbound [`ResultPublisher`], and the SQS [`QueueConsumer`].

pub mod aggregator;
pub mod consumer;
pub mod driver;
pub mod publisher;
pub mod setup;
pub mod telemetry;

pub use aggregator::{EvaluatorSet, FraudAggregator};
pub use consumer::{decide_action, MessageAction, QueueConsumer};
pub use driver::{PipelineDriver, PipelineReport, PipelineStage, StageFailure};
pub use publisher::{ResultPublisher, SqsResultPublisher};
pub use telemetry::init_telemetry;
