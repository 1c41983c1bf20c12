use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::redact::Redacted;

/// Top-level application configuration.
///
/// Loaded once at startup and handed to each component by value or `Arc`;
/// nothing reads configuration from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub crawler: CrawlerConfig,
    pub download: DownloadConfig,
    pub security: SecurityConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret expected in the `Auth` header.
    pub token: String,
    /// Also require the token on the list and presign endpoints.
    #[serde(default = "default_true")]
    pub protect_reads: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `s3` or `memory`.
    pub backend: String,
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_true")]
    pub path_style: bool,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Base URL of the hybrid crawler API, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    #[serde(default = "default_crawler_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    pub user_agent: String,
    pub referer: String,
    #[serde(default = "default_download_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub max_json_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &Redacted::new(&self.token))
            .field("protect_reads", &self.protect_reads)
            .finish()
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &Redacted::new(&self.secret_access_key))
            .field("region", &self.region)
            .field("path_style", &self.path_style)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

fn default_true() -> bool {
    true
}
fn default_region() -> String {
    "auto".to_string()
}
fn default_key_prefix() -> String {
    "douyin".to_string()
}
fn default_crawler_timeout_secs() -> u64 {
    30
}
fn default_download_timeout_secs() -> u64 {
    120
}

impl AppConfig {
    /// Load configuration with layered overrides:
    /// 1. `{dir}/default.toml`
    /// 2. `{dir}/{env}.toml` (based on CLIPVAULT_ENV), merged key by key
    /// 3. Environment variables (CLIPVAULT_* prefix)
    ///
    /// `dir` is `config/` unless CLIPVAULT_CONFIG_DIR says otherwise.
    pub fn load() -> anyhow::Result<Self> {
        let dir = std::env::var("CLIPVAULT_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));
        let env_name =
            std::env::var("CLIPVAULT_ENV").unwrap_or_else(|_| "development".to_string());

        let mut config = Self::load_from_dir(&dir, &env_name)?;
        Self::apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Read and merge the TOML layers from `dir` without touching the
    /// process environment.
    pub fn load_from_dir(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let default_path = dir.join("default.toml");
        let default_content = std::fs::read_to_string(&default_path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", default_path.display(), e))?;
        let mut merged: toml::Value = toml::from_str(&default_content)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", default_path.display(), e))?;

        let env_path = dir.join(format!("{}.toml", env_name));
        if let Ok(env_content) = std::fs::read_to_string(&env_path) {
            let overlay: toml::Value = toml::from_str(&env_content)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", env_path.display(), e))?;
            merge_toml(&mut merged, overlay);
        }

        merged
            .try_into()
            .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))
    }

    fn apply_env_overrides(config: &mut AppConfig) {
        if let Ok(v) = std::env::var("CLIPVAULT_SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_SERVER_PORT") {
            if let Ok(port) = v.parse() {
                config.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("CLIPVAULT_AUTH_TOKEN") {
            config.auth.token = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_STORAGE_BACKEND") {
            config.storage.backend = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_STORAGE_ENDPOINT") {
            config.storage.endpoint = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_STORAGE_BUCKET") {
            config.storage.bucket = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_STORAGE_ACCESS_KEY_ID") {
            config.storage.access_key_id = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_STORAGE_SECRET_ACCESS_KEY") {
            config.storage.secret_access_key = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_STORAGE_REGION") {
            config.storage.region = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_CRAWLER_BASE_URL") {
            config.crawler.base_url = v;
        }
        if let Ok(v) = std::env::var("CLIPVAULT_OBSERVABILITY_LOG_LEVEL") {
            config.observability.log_level = v;
        }
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.token.trim().is_empty() {
            anyhow::bail!("auth.token must be set (or CLIPVAULT_AUTH_TOKEN)");
        }
        match self.storage.backend.as_str() {
            "s3" | "memory" => {}
            other => anyhow::bail!("unknown storage.backend '{}': expected 's3' or 'memory'", other),
        }
        if self.storage.bucket.is_empty() {
            anyhow::bail!("storage.bucket must not be empty");
        }
        if self.crawler.base_url.is_empty() {
            anyhow::bail!("crawler.base_url must not be empty");
        }
        Ok(())
    }
}

/// Recursively overlay `overlay` onto `base`. Tables merge key by key, any
/// other value replaces what was there.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            auth: AuthConfig {
                token: String::new(),
                protect_reads: true,
            },
            storage: StorageConfig {
                backend: "s3".to_string(),
                endpoint: "http://localhost:9000".to_string(),
                bucket: "douyin-videos".to_string(),
                access_key_id: String::new(),
                secret_access_key: String::new(),
                region: default_region(),
                path_style: true,
                key_prefix: default_key_prefix(),
            },
            crawler: CrawlerConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                timeout_secs: default_crawler_timeout_secs(),
            },
            download: DownloadConfig {
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36".to_string(),
                referer: "https://www.douyin.com/".to_string(),
                timeout_secs: default_download_timeout_secs(),
            },
            security: SecurityConfig {
                max_json_body_bytes: 1_048_576, // 1 MB
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: "json".to_string(),
            },
        }
    }
}
