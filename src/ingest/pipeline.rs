use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::error::{ApiError, ResolveError};
use crate::core::redact::redact_url_query;
use crate::core::types::{size_in_mb, Quality, StoredObject, VideoInfo, VideoMetadata};
use crate::observability::metrics as obs;
use crate::storage::keys::{sanitize_filename, video_object_key, MAX_FILENAME_LENGTH, UNKNOWN_VIDEO_ID};
use crate::storage::{ObjectStore, VIDEO_CONTENT_TYPE};

use super::downloader::VideoFetcher;
use super::resolver::{select_download_url, VideoResolver};

/// Result of a successful parse-and-upload run.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub video_info: VideoInfo,
    pub r2_storage: StoredObject,
    pub quality: Quality,
}

/// Resolve → select → download → upload, in that order.
///
/// Every step's failure surfaces directly; the upload is the last step, so
/// nothing is written unless everything before it succeeded.
#[derive(Clone)]
pub struct IngestPipeline {
    resolver: Arc<dyn VideoResolver>,
    fetcher: Arc<dyn VideoFetcher>,
    store: Arc<dyn ObjectStore>,
    key_prefix: String,
}

impl IngestPipeline {
    pub fn new(
        resolver: Arc<dyn VideoResolver>,
        fetcher: Arc<dyn VideoFetcher>,
        store: Arc<dyn ObjectStore>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Archive the video behind `share_url`, keyed under `date`.
    pub async fn run(
        &self,
        share_url: &str,
        quality: Quality,
        date: NaiveDate,
    ) -> Result<UploadOutcome, ApiError> {
        let start = Instant::now();

        let metadata = self.resolve_video(share_url).await?;

        let download_url = metadata
            .video_data
            .as_ref()
            .and_then(|urls| select_download_url(urls, quality))
            .ok_or_else(|| ApiError::validation("unable to obtain a video download URL"))?
            .to_string();

        let video_id = metadata
            .video_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| UNKNOWN_VIDEO_ID.to_string());
        let desc = metadata.desc.clone().unwrap_or_default();

        let download_start = Instant::now();
        let content = self.fetcher.fetch(&download_url).await.map_err(|e| {
            warn!(
                %video_id,
                url = redact_url_query(&download_url),
                error = %e,
                "video download failed"
            );
            ApiError::from(e)
        })?;
        obs::record_download_duration(download_start.elapsed().as_secs_f64());
        obs::add_download_bytes(content.len() as u64);

        if content.is_empty() {
            return Err(ApiError::validation("video download returned no data"));
        }

        let key = video_object_key(&self.key_prefix, date, &video_id);
        let file_size = content.len() as u64;

        self.store
            .put_object(&key, content, VIDEO_CONTENT_TYPE)
            .await?;

        obs::record_upload_duration(start.elapsed().as_secs_f64());
        obs::record_upload_size(file_size as f64);
        info!(
            %video_id,
            %quality,
            bucket = %self.store.bucket(),
            key = %key,
            file_size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "video archived"
        );

        Ok(UploadOutcome {
            video_info: project_video_info(&metadata, video_id),
            r2_storage: StoredObject {
                bucket: self.store.bucket().to_string(),
                path: key,
                file_size,
                file_size_mb: size_in_mb(file_size),
                suggested_filename: format!("{}.mp4", sanitize_filename(&desc, MAX_FILENAME_LENGTH)),
            },
            quality,
        })
    }

    /// Ask the crawler and insist on a playable video.
    async fn resolve_video(&self, share_url: &str) -> Result<VideoMetadata, ApiError> {
        let resolve_start = Instant::now();
        let resolved = self.resolver.resolve(share_url).await;
        obs::record_resolve_duration(resolve_start.elapsed().as_secs_f64());

        let metadata = match resolved {
            Ok(Some(m)) => m,
            Ok(None) => {
                obs::inc_resolve("empty");
                return Err(ApiError::validation("unable to resolve video metadata"));
            }
            Err(e @ ResolveError::Rejected { .. }) => {
                obs::inc_resolve("rejected");
                info!(error = %e, "crawler could not resolve share link");
                return Err(e.into());
            }
            Err(e) => {
                obs::inc_resolve("error");
                warn!(error = %e, "crawler resolution failed");
                return Err(e.into());
            }
        };

        if !metadata.is_video() {
            obs::inc_resolve("not_video");
            let detected = metadata.content_type.as_deref().unwrap_or("unknown");
            return Err(ApiError::validation(format!(
                "only video content is supported, detected type: {}",
                detected
            )));
        }

        obs::inc_resolve("ok");
        Ok(metadata)
    }
}

fn project_video_info(metadata: &VideoMetadata, video_id: String) -> VideoInfo {
    VideoInfo {
        video_id,
        desc: metadata.desc.clone().unwrap_or_default(),
        platform: metadata.platform.clone(),
        content_type: metadata.content_type.clone(),
        create_time: metadata.create_time.clone(),
        author: metadata.author_nickname(),
        statistics: metadata.statistics.clone(),
        cover: metadata.cover(),
    }
}
