use async_trait::async_trait;

use crate::core::error::ResolveError;
use crate::core::types::{Quality, VideoMetadata, VideoUrls};

/// Capability: resolve a share URL (or share text) into video metadata.
///
/// `Ok(None)` means the crawler answered but had nothing for this input.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    async fn resolve(&self, share_url: &str) -> Result<Option<VideoMetadata>, ResolveError>;
}

/// Pick the download URL for `quality`, falling back to the sibling variant.
///
/// - high: no-watermark HQ, else no-watermark standard
/// - low: no-watermark standard, else no-watermark HQ
/// - watermark: watermark HQ, else watermark standard
///
/// Empty strings count as missing.
pub fn select_download_url(urls: &VideoUrls, quality: Quality) -> Option<&str> {
    let (preferred, fallback) = match quality {
        Quality::High => (&urls.nwm_video_url_hq, &urls.nwm_video_url),
        Quality::Low => (&urls.nwm_video_url, &urls.nwm_video_url_hq),
        Quality::Watermark => (&urls.wm_video_url_hq, &urls.wm_video_url),
    };
    non_empty(preferred).or_else(|| non_empty(fallback))
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| !u.trim().is_empty())
}
