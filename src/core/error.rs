use thiserror::Error;

// ---------------------------------------------------------------------------
// Crawler errors
// ---------------------------------------------------------------------------

/// Errors from the crawler adapter.
///
/// `Rejected` is the crawler refusing the input (4xx): the link is not a
/// recognisable video. Everything else is an unexpected failure.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("crawler rejected the input (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("crawler request failed: {reason}")]
    Transport { reason: String },

    #[error("crawler responded with HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("malformed crawler response: {reason}")]
    Decode { reason: String },
}

// ---------------------------------------------------------------------------
// Download errors
// ---------------------------------------------------------------------------

/// Errors from fetching the video payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("video download failed: {reason}")]
    Transport { reason: String },

    #[error("video download returned HTTP {status}")]
    Status { status: u16 },
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors originating from the storage module.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 PUT failed for path {path}: {reason}")]
    PutFailed { path: String, reason: String },

    #[error("S3 LIST failed for prefix {prefix}: {reason}")]
    ListFailed { prefix: String, reason: String },

    #[error("presign failed for path {path}: {reason}")]
    PresignFailed { path: String, reason: String },

    #[error("storage client setup failed: {reason}")]
    Setup { reason: String },
}

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// Errors surfaced to HTTP callers.
///
/// Three coarse categories: authentication (401), validation (400, or 413
/// for an oversized body) and everything else (500). Component errors fold
/// into the 500 variants with their message preserved, except a crawler
/// rejection, which is the caller's input being unusable.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthenticated: invalid Auth token")]
    Unauthorized,

    #[error("{reason}")]
    Validation { reason: String },

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("processing failed: {0}")]
    Processing(String),

    #[error("failed to list videos: {0}")]
    Listing(String),

    #[error("failed to generate download URL: {0}")]
    Presign(String),
}

impl ApiError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ApiError::Validation {
            reason: reason.into(),
        }
    }

    /// Map an ApiError to its HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized => 401,
            ApiError::Validation { .. } => 400,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::Processing(_) | ApiError::Listing(_) | ApiError::Presign(_) => 500,
        }
    }

    /// Return the error code string for JSON responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Validation { .. } => "invalid_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Processing(_) => "processing_failed",
            ApiError::Listing(_) => "list_failed",
            ApiError::Presign(_) => "presign_failed",
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Rejected { detail, .. } => {
                ApiError::validation(format!("unable to resolve video metadata: {}", detail))
            }
            _ => ApiError::Processing(e.to_string()),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::Processing(e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::ListFailed { .. } => ApiError::Listing(e.to_string()),
            StorageError::PresignFailed { .. } => ApiError::Presign(e.to_string()),
            _ => ApiError::Processing(e.to_string()),
        }
    }
}
