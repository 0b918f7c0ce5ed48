//! Content fetcher abstraction
//!
//! This module defines the trait every storage backend implements to hand the
//! pipeline the raw bytes and declared content type of one stored object.

use async_trait::async_trait;
use fraudguard_core::{FileContent, StorageBackend, StorageLocator};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Invalid storage locator: {0}")]
    InvalidLocator(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Read-only access to stored content.
///
/// Implementations perform exactly one remote read per call and never retry;
/// retry policy belongs to whoever redelivers the work item.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the object at `locator` together with its declared content type.
    async fn fetch(&self, locator: &StorageLocator) -> StorageResult<FileContent>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
