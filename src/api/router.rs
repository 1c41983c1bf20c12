use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::core::auth::AuthProvider;
use crate::core::config::SecurityConfig;
use crate::ingest::pipeline::IngestPipeline;
use crate::storage::ObjectStore;

use super::handlers;
use super::middleware::RequestIdLayer;

pub const PARSE_AND_UPLOAD_PATH: &str = "/r2/parse_and_upload";
pub const LIST_VIDEOS_PATH: &str = "/r2/list_videos";
pub const DOWNLOAD_URL_PATH: &str = "/r2/get_download_url";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: IngestPipeline,
    pub store: Arc<dyn ObjectStore>,
    pub auth: Arc<AuthProvider>,
    pub start_time: Instant,
    /// Prometheus metrics handle for rendering /metrics endpoint.
    pub metrics_handle: PrometheusHandle,
}

/// Build the full Axum router with all routes.
///
/// - `POST /r2/parse_and_upload` (Auth header)
/// - `GET  /r2/list_videos` (Auth header unless reads are open)
/// - `GET  /r2/get_download_url` (Auth header unless reads are open)
/// - `GET  /healthz`, `GET /readyz`, `GET /metrics` (open)
pub fn build_router(state: AppState, security_config: &SecurityConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::HeaderName::from_static("auth"),
        ])
        .max_age(std::time::Duration::from_secs(86400));

    let body_limit = DefaultBodyLimit::max(security_config.max_json_body_bytes);

    Router::new()
        .route(PARSE_AND_UPLOAD_PATH, post(handlers::parse_and_upload))
        .route(LIST_VIDEOS_PATH, get(handlers::list_videos))
        .route(DOWNLOAD_URL_PATH, get(handlers::get_download_url))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(cors)
        .layer(body_limit)
        .layer(RequestIdLayer)
        .with_state(state)
}
