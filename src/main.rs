use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use clipvault::api::router::{self, AppState};
use clipvault::core::auth::AuthProvider;
use clipvault::core::config::{AppConfig, StorageConfig};
use clipvault::core::redact::redact_token;
use clipvault::core::shutdown::{ShutdownCoordinator, SHUTDOWN_TIMEOUT_SECS};
use clipvault::ingest::downloader::HttpVideoFetcher;
use clipvault::ingest::hybrid::HybridCrawlerClient;
use clipvault::ingest::pipeline::IngestPipeline;
use clipvault::observability::metrics as obs_metrics;
use clipvault::storage::memory::InMemoryObjectStore;
use clipvault::storage::ObjectStore;

#[tokio::main]
async fn main() -> ExitCode {
    // Must be installed before any metrics are recorded.
    let metrics_handle = match obs_metrics::install_prometheus_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        obs_metrics::inc_panic_total();
        let backtrace = std::backtrace::Backtrace::force_capture();
        eprintln!("PANIC: {info}\nBacktrace:\n{backtrace}");
        default_hook(info);
    }));

    // default.toml → {env}.toml → CLIPVAULT_* env vars
    let config = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    info!(version = env!("CARGO_PKG_VERSION"), "clipvault starting");
    obs_metrics::describe_all_metrics();

    match run(config, metrics_handle).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    config: AppConfig,
    metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> anyhow::Result<ExitCode> {
    let shutdown = ShutdownCoordinator::new();
    let auth = Arc::new(AuthProvider::new(&config.auth));

    let store = build_store(&config.storage)?;
    let resolver = Arc::new(HybridCrawlerClient::new(&config.crawler)?);
    let fetcher = Arc::new(HttpVideoFetcher::new(&config.download)?);
    info!(
        backend = %config.storage.backend,
        bucket = %store.bucket(),
        crawler = %resolver.endpoint(),
        protect_reads = config.auth.protect_reads,
        auth_token = %redact_token(&config.auth.token),
        "components initialized"
    );

    let pipeline = IngestPipeline::new(
        resolver,
        fetcher,
        store.clone(),
        config.storage.key_prefix.clone(),
    );

    let start_time = Instant::now();
    let app_state = AppState {
        pipeline,
        store,
        auth,
        start_time,
        metrics_handle,
    };
    let app = router::build_router(app_state, &config.security);

    let uptime_cancel = shutdown.token();
    tokio::spawn(async move {
        obs_metrics::run_uptime_task(start_time, uptime_cancel).await;
    });

    let http_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid HTTP bind address: {}", e))?;
    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", http_addr, e))?;

    info!(%http_addr, "HTTP server listening");

    let shutdown_token = shutdown.token();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
            })
            .await
    });

    shutdown.wait_for_signal_and_shutdown().await;

    info!("draining in-flight requests");
    match tokio::time::timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), server).await {
        Ok(Ok(Ok(()))) => {
            info!("graceful shutdown completed");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "HTTP server error");
            Ok(ExitCode::FAILURE)
        }
        Ok(Err(e)) => {
            error!(error = %e, "HTTP server task failed");
            Ok(ExitCode::FAILURE)
        }
        Err(_) => {
            error!(
                "shutdown timed out after {}s, forcing exit",
                SHUTDOWN_TIMEOUT_SECS
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Pick the storage backend named in configuration.
fn build_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config.backend.as_str() {
        "memory" => {
            warn!("using in-memory storage; archived videos are lost on restart");
            Ok(Arc::new(InMemoryObjectStore::new(config.bucket.clone())))
        }
        #[cfg(feature = "s3")]
        "s3" => Ok(Arc::new(clipvault::storage::s3::S3ObjectStore::new(config)?)),
        #[cfg(not(feature = "s3"))]
        "s3" => anyhow::bail!("storage.backend = \"s3\" requires the `s3` feature"),
        other => anyhow::bail!("unknown storage backend: {}", other),
    }
}

fn init_tracing(log_level: &str, log_format: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_format {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
