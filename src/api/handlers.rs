use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::auth::{TokenStatus, AUTH_HEADER};
use crate::core::error::ApiError;
use crate::core::redact::redact_token;
use crate::core::security::{
    clamp_list_keys, validate_expires_in, validate_share_text, DEFAULT_LIST_PREFIX,
    DEFAULT_PRESIGN_EXPIRES_SECS,
};
use crate::core::types::{size_in_mb, Quality};
use crate::observability::metrics as obs;

use super::router::{AppState, DOWNLOAD_URL_PATH, LIST_VIDEOS_PATH, PARSE_AND_UPLOAD_PATH};

/// Prefix the readiness probe lists under; it never matches a real object.
const READINESS_PROBE_PREFIX: &str = "__readiness_probe__/";

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    status: u16,
}

fn error_json(status: StatusCode, error: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

/// Render an [`ApiError`] and count it against `endpoint`.
fn api_error(endpoint: &str, err: &ApiError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    obs::inc_http_request(endpoint, status.as_u16());
    error_json(status, err.error_code(), &err.to_string())
}

/// Success envelope: `{code: 200, router: <path>, data}`.
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    code: u16,
    router: &'static str,
    data: T,
}

fn ok_json<T: Serialize>(endpoint: &str, router: &'static str, data: T) -> Response {
    obs::inc_http_request(endpoint, 200);
    Json(ApiResponse {
        code: 200,
        router,
        data,
    })
    .into_response()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Check the `Auth` header against the shared secret.
fn authenticate(state: &AppState, headers: &HeaderMap, endpoint: &str) -> Result<(), Response> {
    let presented = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok());

    match state.auth.check_token(presented) {
        TokenStatus::Valid => Ok(()),
        status => {
            debug!(
                endpoint,
                ?status,
                auth = %redact_token(presented.unwrap_or("")),
                "auth failed"
            );
            obs::inc_auth_failure(endpoint);
            Err(api_error(endpoint, &ApiError::Unauthorized))
        }
    }
}

fn authenticate_read(state: &AppState, headers: &HeaderMap, endpoint: &str) -> Result<(), Response> {
    if state.auth.protects_reads() {
        authenticate(state, headers, endpoint)
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// POST /r2/parse_and_upload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Share URL or the raw share text copied from the app.
    pub url: String,
    #[serde(default)]
    pub quality: Quality,
}

/// `POST /r2/parse_and_upload`
///
/// The body is taken as a `Result` so a bad token is reported as 401 even
/// when the body is malformed too.
pub async fn parse_and_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> Response {
    const ENDPOINT: &str = "parse_and_upload";

    if let Err(resp) = authenticate(&state, &headers, ENDPOINT) {
        return resp;
    }

    let request = match body {
        Ok(Json(r)) => r,
        Err(rejection) => return api_error(ENDPOINT, &json_rejection_error(rejection)),
    };

    if let Err(reason) = validate_share_text(&request.url) {
        return api_error(ENDPOINT, &ApiError::validation(reason));
    }

    info!(quality = %request.quality, "parse and upload requested");

    let today = chrono::Local::now().date_naive();
    match state.pipeline.run(&request.url, request.quality, today).await {
        Ok(outcome) => ok_json(ENDPOINT, PARSE_AND_UPLOAD_PATH, outcome),
        Err(e) => {
            warn!(error = %e, status = e.status_code(), "parse and upload failed");
            api_error(ENDPOINT, &e)
        }
    }
}

/// Oversized bodies keep their 413; every other body problem is a 400.
fn json_rejection_error(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(rejection.body_text())
    } else {
        ApiError::validation(rejection.body_text())
    }
}

// ---------------------------------------------------------------------------
// GET /r2/list_videos
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    pub prefix: Option<String>,
    pub max_keys: Option<usize>,
}

#[derive(Debug, Serialize)]
struct VideoEntry {
    key: String,
    size: u64,
    size_mb: f64,
    last_modified: String,
}

#[derive(Debug, Serialize)]
struct VideoListing {
    count: usize,
    videos: Vec<VideoEntry>,
}

/// `GET /r2/list_videos?prefix=&max_keys=`
pub async fn list_videos(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ListVideosQuery>, QueryRejection>,
) -> Response {
    const ENDPOINT: &str = "list_videos";

    if let Err(resp) = authenticate_read(&state, &headers, ENDPOINT) {
        return resp;
    }

    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return api_error(ENDPOINT, &ApiError::validation(rejection.body_text()));
        }
    };

    let prefix = query
        .prefix
        .unwrap_or_else(|| DEFAULT_LIST_PREFIX.to_string());
    let max_keys = clamp_list_keys(query.max_keys);

    let objects = match state.store.list_objects(&prefix, max_keys).await {
        Ok(objects) => objects,
        Err(e) => {
            warn!(%prefix, error = %e, "listing failed");
            return api_error(ENDPOINT, &ApiError::from(e));
        }
    };

    let videos: Vec<VideoEntry> = objects
        .into_iter()
        .take(max_keys)
        .map(|o| VideoEntry {
            size_mb: size_in_mb(o.size),
            key: o.key,
            size: o.size,
            last_modified: o.last_modified.to_rfc3339(),
        })
        .collect();

    debug!(%prefix, max_keys, count = videos.len(), "videos listed");

    ok_json(
        ENDPOINT,
        LIST_VIDEOS_PATH,
        VideoListing {
            count: videos.len(),
            videos,
        },
    )
}

// ---------------------------------------------------------------------------
// GET /r2/get_download_url
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DownloadUrlQuery {
    pub path: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
struct DownloadUrl {
    path: String,
    download_url: String,
    expires_in: u64,
}

/// `GET /r2/get_download_url?path=&expires_in=`
pub async fn get_download_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<DownloadUrlQuery>, QueryRejection>,
) -> Response {
    const ENDPOINT: &str = "get_download_url";

    if let Err(resp) = authenticate_read(&state, &headers, ENDPOINT) {
        return resp;
    }

    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return api_error(ENDPOINT, &ApiError::validation(rejection.body_text()));
        }
    };

    let path = match query.path.filter(|p| !p.trim().is_empty()) {
        Some(p) => p,
        None => return api_error(ENDPOINT, &ApiError::validation("path must not be empty")),
    };
    let expires_in = query.expires_in.unwrap_or(DEFAULT_PRESIGN_EXPIRES_SECS);
    if let Err(reason) = validate_expires_in(expires_in) {
        return api_error(ENDPOINT, &ApiError::validation(reason));
    }

    match state
        .store
        .presign_get(&path, Duration::from_secs(expires_in))
        .await
    {
        Ok(download_url) => {
            debug!(%path, expires_in, "download URL issued");
            ok_json(
                ENDPOINT,
                DOWNLOAD_URL_PATH,
                DownloadUrl {
                    path,
                    download_url,
                    expires_in,
                },
            )
        }
        Err(e) => {
            warn!(%path, error = %e, "presign failed");
            api_error(ENDPOINT, &ApiError::from(e))
        }
    }
}

// ---------------------------------------------------------------------------
// Health & metrics
// ---------------------------------------------------------------------------

/// `GET /metrics` - Prometheus text exposition.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let metrics = state.metrics_handle.render();
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
        .into_response()
}

/// `GET /healthz` - liveness.
pub async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": uptime,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /readyz` - ready once the bucket answers a listing.
pub async fn readyz(State(state): State<AppState>) -> Response {
    let (http_status, storage) = match state.store.list_objects(READINESS_PROBE_PREFIX, 1).await {
        Ok(_) => (StatusCode::OK, serde_json::json!({"status": "ok"})),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({"status": "error", "error": e.to_string()}),
        ),
    };

    let status = if http_status.is_success() {
        "ready"
    } else {
        "not_ready"
    };

    (
        http_status,
        Json(serde_json::json!({
            "status": status,
            "checks": { "storage": storage },
            "bucket": state.store.bucket(),
        })),
    )
        .into_response()
}
