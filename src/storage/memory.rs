use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::core::error::StorageError;

use super::{ObjectInfo, ObjectStore};

// ---------------------------------------------------------------------------
// InMemoryObjectStore
// ---------------------------------------------------------------------------

/// In-memory storage backend for development and tests.
///
/// Objects live in a `BTreeMap` behind a `RwLock`, so listings come back in
/// key order like S3. Presigned URLs use a `memory://` scheme and are not
/// fetchable.
pub struct InMemoryObjectStore {
    bucket: String,
    objects: Arc<RwLock<BTreeMap<String, StoredBlob>>>,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: String,
    created_at: chrono::DateTime<Utc>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Body and content type of a stored object.
    pub async fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| (o.data.clone(), o.content_type.clone()))
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        max_keys: usize,
    ) -> Result<Vec<ObjectInfo>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .take(max_keys)
            .map(|(k, v)| ObjectInfo {
                key: k.clone(),
                size: v.data.len() as u64,
                last_modified: v.created_at,
            })
            .collect())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        if key.is_empty() {
            return Err(StorageError::PresignFailed {
                path: key.to_string(),
                reason: "empty key".to_string(),
            });
        }
        Ok(format!(
            "memory://{}/{}?expires_in={}",
            self.bucket,
            key,
            expires_in.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryObjectStore::new("videos");
        let data = Bytes::from(vec![0xAA; 1000]);

        store
            .put_object("douyin/2026/01/04/1.mp4", data.clone(), "video/mp4")
            .await
            .unwrap();

        let (body, content_type) = store.get("douyin/2026/01/04/1.mp4").await.unwrap();
        assert_eq!(body, data);
        assert_eq!(content_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryObjectStore::new("videos");
        store
            .put_object("k.mp4", Bytes::from("first"), "video/mp4")
            .await
            .unwrap();
        store
            .put_object("k.mp4", Bytes::from("second"), "video/mp4")
            .await
            .unwrap();

        assert_eq!(store.object_count().await, 1);
        let (body, _) = store.get("k.mp4").await.unwrap();
        assert_eq!(body, Bytes::from("second"));
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix_in_key_order() {
        let store = InMemoryObjectStore::new("videos");
        for key in [
            "douyin/2026/01/05/b.mp4",
            "douyin/2026/01/04/a.mp4",
            "other/x.mp4",
        ] {
            store
                .put_object(key, Bytes::from("abc"), "video/mp4")
                .await
                .unwrap();
        }

        let objects = store.list_objects("douyin/", 100).await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].key, "douyin/2026/01/04/a.mp4");
        assert_eq!(objects[1].key, "douyin/2026/01/05/b.mp4");
        assert_eq!(objects[0].size, 3);
    }

    #[tokio::test]
    async fn test_list_respects_max_keys() {
        let store = InMemoryObjectStore::new("videos");
        for i in 0..10 {
            store
                .put_object(&format!("douyin/{i}.mp4"), Bytes::from("x"), "video/mp4")
                .await
                .unwrap();
        }

        assert_eq!(store.list_objects("douyin/", 3).await.unwrap().len(), 3);
        assert!(store.list_objects("douyin/", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_presign() {
        let store = InMemoryObjectStore::new("videos");
        let url = store
            .presign_get("douyin/a.mp4", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(url, "memory://videos/douyin/a.mp4?expires_in=60");
        assert!(store.presign_get("", Duration::from_secs(60)).await.is_err());
    }
}
