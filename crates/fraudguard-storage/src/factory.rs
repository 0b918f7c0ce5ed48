#[cfg(feature = "storage-local")]
use crate::LocalContentFetcher;
#[cfg(feature = "storage-s3")]
use crate::S3ContentFetcher;
use crate::{ContentFetcher, StorageError, StorageResult};
use fraudguard_core::{StorageBackend, StorageConfig};
use std::sync::Arc;

/// Create a content fetcher based on configuration
pub async fn create_fetcher(config: &StorageConfig) -> StorageResult<Arc<dyn ContentFetcher>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let fetcher = S3ContentFetcher::new(config.region.clone(), config.s3_endpoint.clone());
            Ok(Arc::new(fetcher))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let fetcher = LocalContentFetcher::new(base_path).await?;
            Ok(Arc::new(fetcher))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
