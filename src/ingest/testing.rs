//! Test doubles for the crawler and the downloader.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::error::{FetchError, ResolveError};
use crate::core::types::{CoverData, VideoMetadata, VideoUrls};

use super::downloader::VideoFetcher;
use super::resolver::VideoResolver;

/// A resolved video post with every URL variant present.
pub fn sample_metadata() -> VideoMetadata {
    VideoMetadata {
        content_type: Some("video".to_string()),
        platform: Some("douyin".to_string()),
        video_id: Some("123".to_string()),
        desc: Some("sunset#beach".to_string()),
        create_time: Some(serde_json::json!(1767484800)),
        author: Some(serde_json::json!({"nickname": "alice", "uid": "42"})),
        statistics: Some(serde_json::json!({"digg_count": 7})),
        cover_data: Some(CoverData {
            cover: Some(serde_json::json!({"url_list": ["https://p3.example/c.jpg"]})),
        }),
        video_data: Some(VideoUrls {
            nwm_video_url_hq: Some("https://cdn.example/nwm_hq.mp4".to_string()),
            nwm_video_url: Some("https://cdn.example/nwm.mp4".to_string()),
            wm_video_url_hq: Some("https://cdn.example/wm_hq.mp4".to_string()),
            wm_video_url: Some("https://cdn.example/wm.mp4".to_string()),
        }),
    }
}

pub enum StubResolver {
    Found(VideoMetadata),
    Empty,
    Failing,
    Rejecting(String),
}

impl StubResolver {
    pub fn returning(metadata: VideoMetadata) -> Self {
        StubResolver::Found(metadata)
    }

    pub fn empty() -> Self {
        StubResolver::Empty
    }

    pub fn failing() -> Self {
        StubResolver::Failing
    }

    pub fn rejecting(detail: &str) -> Self {
        StubResolver::Rejecting(detail.to_string())
    }
}

#[async_trait]
impl VideoResolver for StubResolver {
    async fn resolve(&self, _share_url: &str) -> Result<Option<VideoMetadata>, ResolveError> {
        match self {
            StubResolver::Found(m) => Ok(Some(m.clone())),
            StubResolver::Empty => Ok(None),
            StubResolver::Failing => Err(ResolveError::UpstreamStatus { status: 502 }),
            StubResolver::Rejecting(detail) => Err(ResolveError::Rejected {
                status: 400,
                detail: detail.clone(),
            }),
        }
    }
}

/// Fetcher returning a fixed payload (or a fixed HTTP status) and recording
/// every URL it was asked for.
pub struct StubFetcher {
    outcome: Result<Bytes, u16>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StubFetcher {
    pub fn returning(payload: Bytes) -> Self {
        Self {
            outcome: Ok(payload),
            requested: Arc::default(),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            outcome: Err(status),
            requested: Arc::default(),
        }
    }

    pub fn requested_urls(&self) -> Arc<Mutex<Vec<String>>> {
        self.requested.clone()
    }
}

#[async_trait]
impl VideoFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match &self.outcome {
            Ok(payload) => Ok(payload.clone()),
            Err(status) => Err(FetchError::Status { status: *status }),
        }
    }
}
