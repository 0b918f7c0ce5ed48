use crate::traits::{ContentFetcher, StorageError, StorageResult};
use async_trait::async_trait;
use fraudguard_core::{FileContent, StorageBackend, StorageLocator};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, ObjectStoreExt, Result as ObjectResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default number of per-bucket clients kept alive.
pub const DEFAULT_BUCKET_CACHE_CAPACITY: usize = 32;

/// S3 content fetcher.
///
/// Work items name their own bucket, so one `AmazonS3` client is built lazily
/// per bucket. At most `cache_capacity` clients are cached; buckets beyond that
/// get a client built for the single fetch.
#[derive(Clone)]
pub struct S3ContentFetcher {
    stores: Arc<RwLock<HashMap<String, Arc<AmazonS3>>>>,
    cache_capacity: usize,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

/// Convert an object key to an object_store path without re-encoding it.
///
/// Keys are used verbatim. Keys that object_store cannot represent as-is
/// (empty segments, `.`/`..`, leading or trailing `/`) are rejected.
pub(crate) fn object_path(key: &str) -> StorageResult<Path> {
    let path = Path::parse(key)
        .map_err(|e| StorageError::InvalidLocator(format!("{}: {}", key, e)))?;
    if path.as_ref() != key {
        return Err(StorageError::InvalidLocator(key.to_string()));
    }
    Ok(path)
}

impl S3ContentFetcher {
    /// Create a new S3ContentFetcher
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "http://localhost:4566" for LocalStack)
    pub fn new(region: String, endpoint_url: Option<String>) -> Self {
        Self::with_cache_capacity(region, endpoint_url, DEFAULT_BUCKET_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(
        region: String,
        endpoint_url: Option<String>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            stores: Arc::new(RwLock::new(HashMap::new())),
            cache_capacity,
            region,
            endpoint_url,
        }
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    async fn store_for(&self, bucket: &str) -> StorageResult<Arc<AmazonS3>> {
        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store = Arc::new(self.build_store(bucket)?);
        if stores.len() < self.cache_capacity {
            stores.insert(bucket.to_string(), store.clone());
        } else {
            tracing::debug!(
                bucket = %bucket,
                cache_capacity = self.cache_capacity,
                "Bucket client cache full, using uncached client"
            );
        }
        Ok(store)
    }
}

#[async_trait]
impl ContentFetcher for S3ContentFetcher {
    async fn fetch(&self, locator: &StorageLocator) -> StorageResult<FileContent> {
        if locator.bucket.is_empty() || locator.key.is_empty() {
            return Err(StorageError::InvalidLocator(locator.to_string()));
        }

        let location = object_path(&locator.key)?;
        let start = std::time::Instant::now();
        let store = self.store_for(&locator.bucket).await?;

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(locator.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %locator.bucket,
                    key = %locator.key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 fetch failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| value.to_string());

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %locator.bucket,
            key = %locator.key,
            size_bytes = bytes.len(),
            content_type = ?content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 fetch successful"
        );

        Ok(FileContent::new(bytes, content_type))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
