use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Quality selection
// ---------------------------------------------------------------------------

/// Which variant of the video to archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// High-quality stream without the platform watermark.
    #[default]
    High,
    /// Standard stream without the platform watermark.
    Low,
    /// Stream with the platform watermark baked in.
    Watermark,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Low => "low",
            Quality::Watermark => "watermark",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Crawler metadata (minimal mode)
// ---------------------------------------------------------------------------

/// Content type the crawler reports for playable videos.
pub const VIDEO_CONTENT_TYPE: &str = "video";

/// A single post as resolved by the hybrid crawler in minimal mode.
///
/// Everything except `video_data` is passed through to the caller untouched;
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub video_id: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub create_time: Option<serde_json::Value>,
    #[serde(default)]
    pub author: Option<serde_json::Value>,
    #[serde(default)]
    pub statistics: Option<serde_json::Value>,
    #[serde(default)]
    pub cover_data: Option<CoverData>,
    #[serde(default)]
    pub video_data: Option<VideoUrls>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverData {
    #[serde(default)]
    pub cover: Option<serde_json::Value>,
}

/// Candidate download URLs for the four variants the crawler exposes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoUrls {
    #[serde(rename = "nwm_video_url_HQ", default)]
    pub nwm_video_url_hq: Option<String>,
    #[serde(default)]
    pub nwm_video_url: Option<String>,
    #[serde(rename = "wm_video_url_HQ", default)]
    pub wm_video_url_hq: Option<String>,
    #[serde(default)]
    pub wm_video_url: Option<String>,
}

impl VideoMetadata {
    pub fn is_video(&self) -> bool {
        self.content_type.as_deref() == Some(VIDEO_CONTENT_TYPE)
    }

    /// Author nickname, when the crawler returned the author as an object.
    pub fn author_nickname(&self) -> Option<String> {
        self.author
            .as_ref()
            .and_then(|a| a.as_object())
            .and_then(|a| a.get("nickname"))
            .and_then(|n| n.as_str())
            .map(str::to_string)
    }

    pub fn cover(&self) -> Option<serde_json::Value> {
        self.cover_data.as_ref().and_then(|c| c.cover.clone())
    }
}

/// Video ids arrive as strings from some platforms and as integers from
/// others; store both as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Response projections
// ---------------------------------------------------------------------------

/// The subset of [`VideoMetadata`] echoed back after an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub desc: String,
    pub platform: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub create_time: Option<serde_json::Value>,
    pub author: Option<String>,
    pub statistics: Option<serde_json::Value>,
    pub cover: Option<serde_json::Value>,
}

/// Where an upload landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub file_size: u64,
    pub file_size_mb: f64,
    /// Filesystem-safe name derived from the description, for clients that
    /// save the download locally.
    pub suggested_filename: String,
}

/// Bytes to megabytes, rounded to two decimals.
pub fn size_in_mb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0
}
