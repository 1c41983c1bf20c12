pub mod keys;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::StorageError;

// ---------------------------------------------------------------------------
// ObjectStore trait
// ---------------------------------------------------------------------------

/// Narrow abstraction over the object store: put, list and presign.
///
/// Object-safe so the router can hold `Arc<dyn ObjectStore>` and pick the
/// backend from configuration at startup. The production implementation
/// (`S3ObjectStore`) wraps `aws-sdk-s3`; `InMemoryObjectStore` needs no
/// external services.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name reported back to callers.
    fn bucket(&self) -> &str;

    /// Write an object, overwriting whatever is stored under `key`.
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str)
        -> Result<(), StorageError>;

    /// List at most `max_keys` objects under `prefix` (single page).
    async fn list_objects(
        &self,
        prefix: &str,
        max_keys: usize,
    ) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Produce a time-limited GET URL for `key`. Local computation only.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;
}

// ---------------------------------------------------------------------------
// Storage types
// ---------------------------------------------------------------------------

/// Information about an object from a LIST operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Content type used for every archived video.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
