use chrono::{Datelike, NaiveDate};

/// Stand-in when the crawler does not report a video id.
pub const UNKNOWN_VIDEO_ID: &str = "unknown";

/// Fallback for descriptions that sanitize to nothing.
const DEFAULT_FILENAME: &str = "video";

/// Default maximum length of a sanitized filename, in characters.
pub const MAX_FILENAME_LENGTH: usize = 50;

const UNSAFE_FILENAME_CHARS: &[char] = &[
    '/', '\\', ':', '*', '?', '"', '<', '>', '|', '\n', '\r', '#', '@',
];

/// Object key for an archived video: `{prefix}/{yyyy}/{mm}/{dd}/{video_id}.mp4`.
///
/// The key depends only on the id and the date, so re-archiving the same
/// video on the same day overwrites the earlier object.
pub fn video_object_key(prefix: &str, date: NaiveDate, video_id: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let video_id = if video_id.is_empty() {
        UNKNOWN_VIDEO_ID
    } else {
        video_id
    };
    format!(
        "{}/{:04}/{:02}/{:02}/{}.mp4",
        prefix,
        date.year(),
        date.month(),
        date.day(),
        video_id
    )
}

/// Turn a free-text description into a filesystem-safe file stem.
///
/// Unsafe characters become `_`, runs of `_` collapse, leading and trailing
/// `_`/spaces are trimmed and the result is cut to `max_length` characters.
/// Empty results fall back to `video`.
pub fn sanitize_filename(desc: &str, max_length: usize) -> String {
    if desc.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }

    let mut safe: String = desc
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();

    while safe.contains("__") {
        safe = safe.replace("__", "_");
    }

    let trimmed = safe.trim_matches(|c| c == '_' || c == ' ');
    let truncated: String = trimmed.chars().take(max_length).collect();

    if truncated.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        truncated
    }
}
