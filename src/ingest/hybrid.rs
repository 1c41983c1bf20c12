use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::config::CrawlerConfig;
use crate::core::error::ResolveError;
use crate::core::types::VideoMetadata;

use super::resolver::VideoResolver;

/// Path of the hybrid crawler's single-video endpoint.
const VIDEO_DATA_PATH: &str = "/api/hybrid/video_data";

/// Response envelope used by the crawler API.
#[derive(Debug, Deserialize)]
struct CrawlerEnvelope {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    data: Option<VideoMetadata>,
}

/// [`VideoResolver`] backed by the hybrid crawler's HTTP API.
///
/// Calls `GET {base_url}/api/hybrid/video_data?url=...&minimal=true`. The
/// crawler does the platform detection, share-text URL extraction and
/// signing; this side only decodes the envelope.
pub struct HybridCrawlerClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HybridCrawlerClient {
    pub fn new(config: &CrawlerConfig) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResolveError::Transport {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), VIDEO_DATA_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VideoResolver for HybridCrawlerClient {
    async fn resolve(&self, share_url: &str) -> Result<Option<VideoMetadata>, ResolveError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", share_url), ("minimal", "true")])
            .send()
            .await
            .map_err(|e| ResolveError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.bytes().await.unwrap_or_default();
            let detail = rejection_detail(&body)
                .unwrap_or_else(|| format!("unrecognised share link (HTTP {})", status.as_u16()));
            debug!(status = status.as_u16(), %detail, "crawler rejected share link");
            return Err(ResolveError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "crawler returned an error status");
            return Err(ResolveError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| ResolveError::Transport {
            reason: e.to_string(),
        })?;

        decode_envelope(&body)
    }
}

/// Decode a crawler response body. `data: null` (or absent) means the
/// crawler found nothing.
fn decode_envelope(body: &[u8]) -> Result<Option<VideoMetadata>, ResolveError> {
    let envelope: CrawlerEnvelope =
        serde_json::from_slice(body).map_err(|e| ResolveError::Decode {
            reason: e.to_string(),
        })?;
    debug!(code = ?envelope.code, has_data = envelope.data.is_some(), "crawler envelope decoded");
    Ok(envelope.data)
}

/// Pull the human-readable reason out of a crawler error body:
/// `{"detail": "..."}` or `{"detail": {"message": "..."}}`.
fn rejection_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let detail = value.get("detail")?;
    let message = match detail {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map.get("message")?.as_str()?.to_string(),
        _ => return None,
    };
    Some(message).filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve exactly one canned HTTP response on a loopback port.
    async fn crawler_answering(status_line: &'static str, body: &'static str) -> CrawlerConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        CrawlerConfig {
            base_url: format!("http://{}", addr),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_client_error_is_rejection_with_detail() {
        let config = crawler_answering(
            "400 Bad Request",
            r#"{"detail":{"message":"Cannot judge the video source from the URL."}}"#,
        )
        .await;
        let client = HybridCrawlerClient::new(&config).unwrap();

        match client.resolve("not a video link").await {
            Err(ResolveError::Rejected { status, detail }) => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Cannot judge the video source from the URL.");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejection_through_pipeline_is_bad_request() {
        use crate::core::types::Quality;
        use crate::ingest::pipeline::IngestPipeline;
        use crate::ingest::testing::StubFetcher;
        use crate::storage::memory::InMemoryObjectStore;
        use std::sync::Arc;

        let config = crawler_answering(
            "400 Bad Request",
            r#"{"detail":{"message":"Cannot judge the video source from the URL."}}"#,
        )
        .await;
        let pipeline = IngestPipeline::new(
            Arc::new(HybridCrawlerClient::new(&config).unwrap()),
            Arc::new(StubFetcher::returning(bytes::Bytes::from_static(b"x"))),
            Arc::new(InMemoryObjectStore::new("douyin-videos")),
            "douyin",
        );

        let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 4).unwrap();
        let err = pipeline
            .run("not a video link", Quality::High, date)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err
            .to_string()
            .contains("Cannot judge the video source from the URL."));
    }

    #[tokio::test]
    async fn test_plain_string_detail_and_empty_body() {
        let config = crawler_answering("404 Not Found", r#"{"detail":"Not Found"}"#).await;
        let client = HybridCrawlerClient::new(&config).unwrap();
        assert!(matches!(
            client.resolve("x").await,
            Err(ResolveError::Rejected { status: 404, ref detail }) if detail == "Not Found"
        ));

        let config = crawler_answering("422 Unprocessable Entity", "").await;
        let client = HybridCrawlerClient::new(&config).unwrap();
        assert!(matches!(
            client.resolve("x").await,
            Err(ResolveError::Rejected { status: 422, .. })
        ));
    }

    #[tokio::test]
    async fn test_server_error_stays_upstream_failure() {
        let config = crawler_answering(
            "500 Internal Server Error",
            r#"{"detail":"boom"}"#,
        )
        .await;
        let client = HybridCrawlerClient::new(&config).unwrap();
        assert!(matches!(
            client.resolve("https://v.douyin.com/abc/").await,
            Err(ResolveError::UpstreamStatus { status: 500 })
        ));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = HybridCrawlerClient::new(&CrawlerConfig {
            base_url: "http://127.0.0.1:8000/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:8000/api/hybrid/video_data");
    }

    #[test]
    fn test_decode_envelope_with_data() {
        let body = br#"{
            "code": 200,
            "router": "/api/hybrid/video_data",
            "data": {
                "type": "video",
                "platform": "douyin",
                "video_id": "123",
                "video_data": {"nwm_video_url_HQ": "https://cdn.example/hq.mp4"}
            }
        }"#;
        let meta = decode_envelope(body).unwrap().unwrap();
        assert_eq!(meta.video_id.as_deref(), Some("123"));
        assert!(meta.is_video());
    }

    #[test]
    fn test_decode_envelope_null_data() {
        let body = br#"{"code": 200, "router": "/api/hybrid/video_data", "data": null}"#;
        assert!(decode_envelope(body).unwrap().is_none());
    }

    #[test]
    fn test_decode_envelope_garbage() {
        assert!(matches!(
            decode_envelope(b"<html>rate limited</html>"),
            Err(ResolveError::Decode { .. })
        ));
    }
}
