//! Fraudguard Storage Library
//!
//! This crate provides the Content Fetcher: the `ContentFetcher` trait and its
//! S3 and local filesystem implementations. A fetch turns a storage locator
//! (bucket + key) into the object's bytes and declared content type.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_fetcher;
pub use fraudguard_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalContentFetcher;
#[cfg(feature = "storage-s3")]
pub use s3::S3ContentFetcher;
pub use traits::{ContentFetcher, StorageError, StorageResult};
