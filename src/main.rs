//! Click Heatmap Aggregator
//!
//! Serves per-page click density summaries:
//! - Bearer-token authenticated `GET /heatmap/*page_path`
//! - Sequential paginated reads from the ClickHouse click store
//! - Spatial binning with a bounded number of grid cells

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState, HeatmapSettings};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig};
use telemetry::{health, init_tracing_from_env, log_metrics_snapshot, metrics};

/// How often store health is re-checked and metrics are logged.
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Auth service URL for bearer token validation ("mock" to accept any token)
    #[serde(default = "default_auth_url")]
    auth_url: String,

    #[serde(default)]
    clickhouse: ClickHouseConfig,

    #[serde(default)]
    heatmap: HeatmapSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_auth_url() -> String {
    "http://auth-service:8080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_url: default_auth_url(),
            clickhouse: ClickHouseConfig::default(),
            heatmap: HeatmapSettings::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Heatmap Aggregator v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        clickhouse_url = %config.clickhouse.url,
        database = %config.clickhouse.database,
        page_size = config.heatmap.page_size,
        max_bins = config.heatmap.max_bins,
        "Loaded configuration"
    );

    let clickhouse = Arc::new(ClickHouseClient::new(config.clickhouse.clone()));

    if let Err(e) = clickhouse_client::health::init_schema(&clickhouse).await {
        error!("Failed to initialize ClickHouse schema: {}", e);
        // Heatmaps degrade to empty results until the table exists.
    }

    check_health(&clickhouse).await;

    let _housekeeping = spawn_housekeeping(clickhouse.clone());

    let state = AppState::with_settings(clickhouse.clone(), &config.auth_url, config.heatmap);
    if state.auth_client.is_mock() {
        warn!("Auth client in mock mode, any well-formed token is accepted");
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log_metrics_snapshot(&metrics().snapshot());
    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("HEATMAP")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Nested fields with underscores don't split cleanly on "__"
    if let Ok(url) = std::env::var("HEATMAP_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("HEATMAP_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("HEATMAP_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("HEATMAP_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    if let Ok(auth_url) = std::env::var("HEATMAP_AUTH_URL") {
        config.auth_url = auth_url;
    }

    Ok(config)
}

/// Probe the click store and record connectivity and provisioning.
async fn check_health(clickhouse: &ClickHouseClient) {
    if !clickhouse_client::health::check_connection(clickhouse).await {
        health().click_store.set_unhealthy("Connection failed");
        error!("ClickHouse connection: unhealthy");
        return;
    }

    health().click_store.set_healthy();
    match clickhouse_client::health::is_provisioned(clickhouse).await {
        Ok(provisioned) => {
            health().click_store.set_provisioned(provisioned);
            if provisioned {
                info!("ClickHouse connection: healthy");
            } else {
                warn!("ClickHouse reachable but click table missing; heatmaps will be empty");
            }
        }
        Err(e) => warn!("Could not check click table: {}", e),
    }
}

/// Periodic store health refresh and metrics logging.
fn spawn_housekeeping(clickhouse: Arc<ClickHouseClient>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            check_health(&clickhouse).await;
            log_metrics_snapshot(&metrics().snapshot());
        }
    })
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
