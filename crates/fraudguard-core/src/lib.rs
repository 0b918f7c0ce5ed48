//! Fraudguard Core Library
//!
//! This crate provides the domain models, error taxonomy, policy enums and
//! configuration shared by every Fraudguard component.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;

// Re-export commonly used types
pub use config::{
    Config, DatabaseConfig, EndpointConfig, QueueConfig, StorageBackend, StorageConfig,
    WorkerConfig,
};
pub use error::{EvaluationError, PipelineError};
pub use models::{
    EvaluatorKind, FileContent, FraudRecord, NotificationMessage, StorageLocator,
    UserFraudStatus, VerdictSet, WorkItem,
};
pub use policy::{EvaluationMode, FailureDisposition, FailurePolicy};
