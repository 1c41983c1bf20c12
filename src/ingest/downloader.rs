use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};

use crate::core::config::DownloadConfig;
use crate::core::error::FetchError;

/// Capability: fetch a video payload into memory.
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Maximum redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// [`VideoFetcher`] doing one buffered GET with browser-like headers.
///
/// Video CDNs reject requests without a platform referer, so every request
/// carries the configured `User-Agent` and `Referer`. Redirects are followed;
/// there is no retry.
pub struct HttpVideoFetcher {
    client: reqwest::Client,
}

impl HttpVideoFetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(REFERER, header_value(&config.referer)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Transport {
                reason: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::Transport {
        reason: format!("invalid header value: {}", e),
    })
}

#[async_trait]
impl VideoFetcher for HttpVideoFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| FetchError::Transport {
            reason: e.to_string(),
        })
    }
}
