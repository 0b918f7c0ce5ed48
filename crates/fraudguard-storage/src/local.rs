use crate::traits::{ContentFetcher, StorageError, StorageResult};
use async_trait::async_trait;
use fraudguard_core::{FileContent, StorageBackend, StorageLocator};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Local filesystem content fetcher
///
/// Buckets map to subdirectories of `base_path`; keys are relative paths
/// inside them. Used for development and tests.
#[derive(Clone)]
pub struct LocalContentFetcher {
    base_path: PathBuf,
}

impl LocalContentFetcher {
    /// Create a new LocalContentFetcher
    ///
    /// # Arguments
    /// * `base_path` - Root directory holding one subdirectory per bucket
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalContentFetcher { base_path })
    }

    /// Convert a locator to a filesystem path, rejecting anything that could
    /// escape the base directory.
    fn locator_to_path(&self, locator: &StorageLocator) -> StorageResult<PathBuf> {
        for part in [&locator.bucket, &locator.key] {
            let relative = Path::new(part.as_str());
            let is_plain = !part.is_empty()
                && relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !is_plain {
                return Err(StorageError::InvalidLocator(locator.to_string()));
            }
        }

        Ok(self.base_path.join(&locator.bucket).join(&locator.key))
    }
}

/// Best-effort content type from the file extension.
fn content_type_for(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    let content_type = match extension.as_str() {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(content_type.to_string())
}

#[async_trait]
impl ContentFetcher for LocalContentFetcher {
    async fn fetch(&self, locator: &StorageLocator) -> StorageResult<FileContent> {
        let path = self.locator_to_path(locator)?;

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(locator.to_string()),
            _ => StorageError::IoError(e),
        })?;

        tracing::debug!(
            bucket = %locator.bucket,
            key = %locator.key,
            size_bytes = data.len(),
            "Local fetch successful"
        );

        Ok(FileContent::new(data, content_type_for(&path)))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
