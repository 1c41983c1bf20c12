use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::core::config::StorageConfig;
use crate::core::error::StorageError;
use crate::observability::metrics as obs;

use super::{ObjectInfo, ObjectStore};

// ---------------------------------------------------------------------------
// S3ObjectStore
// ---------------------------------------------------------------------------

/// Production storage backend wrapping `aws-sdk-s3`.
///
/// Works against AWS S3 and S3-compatible stores (Cloudflare R2, MinIO)
/// through a configurable endpoint and path-style addressing. Requests are
/// sent once; the SDK's own retry layer is left at its defaults.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new S3ObjectStore from configuration. No network I/O.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
            return Err(StorageError::Setup {
                reason: "storage.access_key_id and storage.secret_access_key are required for the s3 backend"
                    .to_string(),
            });
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "clipvault-config",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.path_style);

        if !config.endpoint.is_empty() {
            s3_config_builder = s3_config_builder.endpoint_url(&config.endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = data.len() as u64;
        let start = Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    bucket = %self.bucket,
                    key,
                    size_bytes = size,
                    "S3 PUT failed"
                );
                obs::inc_storage_error("put");
                StorageError::PutFailed {
                    path: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let elapsed = start.elapsed().as_secs_f64();
        obs::record_storage_duration("put", elapsed);
        info!(
            bucket = %self.bucket,
            key,
            size_bytes = size,
            duration_ms = elapsed * 1000.0,
            "S3 PUT successful"
        );
        Ok(())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        max_keys: usize,
    ) -> Result<Vec<ObjectInfo>, StorageError> {
        if max_keys == 0 {
            return Ok(Vec::new());
        }
        let start = Instant::now();

        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(i32::try_from(max_keys).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| {
                obs::inc_storage_error("list");
                StorageError::ListFailed {
                    prefix: prefix.to_string(),
                    reason: e.to_string(),
                }
            })?;

        obs::record_storage_duration("list", start.elapsed().as_secs_f64());

        let objects: Vec<ObjectInfo> = output
            .contents
            .unwrap_or_default()
            .into_iter()
            .take(max_keys)
            .map(|obj| ObjectInfo {
                key: obj.key.unwrap_or_default(),
                size: obj.size.unwrap_or(0).max(0) as u64,
                last_modified: obj
                    .last_modified
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
                    .unwrap_or_else(Utc::now),
            })
            .collect();

        debug!(prefix, max_keys, count = objects.len(), "S3 LIST complete");
        Ok(objects)
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::PresignFailed {
                path: key.to_string(),
                reason: e.to_string(),
            })?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                obs::inc_storage_error("presign");
                StorageError::PresignFailed {
                    path: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        Ok(presigned.uri().to_string())
    }
}
