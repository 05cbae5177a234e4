//! ClickHouse for integration tests: a throwaway container, or an existing
//! server named by `HEATMAP_TEST_CLICKHOUSE_URL`.

use clickhouse_client::ClickHouseConfig;
use std::time::{Duration, Instant};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

/// Database the click table lives in.
pub const TEST_DATABASE: &str = "heatmap";

const CLICKHOUSE_IMAGE: (&str, &str) = ("clickhouse/clickhouse-server", "24.3");
const HTTP_PORT: u16 = 8123;
const READY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TestContainers {
    /// Dropping the handle stops the container.
    _clickhouse: Option<ContainerAsync<GenericImage>>,
    config: ClickHouseConfig,
}

impl TestContainers {
    pub async fn start() -> Self {
        if let Some(config) = external_config() {
            return Self {
                _clickhouse: None,
                config,
            };
        }

        let (container, url) = start_clickhouse().await;
        Self {
            _clickhouse: Some(container),
            config: ClickHouseConfig::new(url)
                .with_database(TEST_DATABASE)
                .with_credentials(Some("default".to_string()), None),
        }
    }

    pub fn clickhouse_config(&self) -> ClickHouseConfig {
        self.config.clone()
    }
}

fn external_config() -> Option<ClickHouseConfig> {
    let url = std::env::var("HEATMAP_TEST_CLICKHOUSE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())?;
    let database =
        std::env::var("HEATMAP_TEST_CLICKHOUSE_DB").unwrap_or_else(|_| TEST_DATABASE.to_string());

    Some(ClickHouseConfig::new(url).with_database(database).with_credentials(
        std::env::var("HEATMAP_TEST_CLICKHOUSE_USER").ok(),
        std::env::var("HEATMAP_TEST_CLICKHOUSE_PASSWORD").ok(),
    ))
}

/// Start a ClickHouse container and return it with its HTTP URL.
pub async fn start_clickhouse() -> (ContainerAsync<GenericImage>, String) {
    let (name, tag) = CLICKHOUSE_IMAGE;
    let container = GenericImage::new(name, tag)
        .with_wait_for(WaitFor::seconds(5))
        .with_exposed_port(HTTP_PORT.tcp())
        .with_env_var("CLICKHOUSE_DB", TEST_DATABASE)
        .with_env_var("CLICKHOUSE_DEFAULT_ACCESS_MANAGEMENT", "1")
        .with_env_var("CLICKHOUSE_USER", "default")
        .with_env_var("CLICKHOUSE_PASSWORD", "")
        .start()
        .await
        .expect("Failed to start ClickHouse");

    let port = container
        .get_host_port_ipv4(HTTP_PORT)
        .await
        .expect("ClickHouse HTTP port not mapped");
    let url = format!("http://127.0.0.1:{}", port);

    wait_until_ready(&url).await;
    (container, url)
}

/// Poll `/ping` until ClickHouse answers.
async fn wait_until_ready(url: &str) {
    let client = reqwest::Client::new();
    let ping = format!("{}/ping", url);
    let start = Instant::now();

    while start.elapsed() < READY_TIMEOUT {
        match client.get(&ping).send().await {
            Ok(resp) if resp.status().is_success() => return,
            _ => tokio::time::sleep(Duration::from_millis(500)).await,
        }
    }
    panic!("ClickHouse at {} not ready after {:?}", url, READY_TIMEOUT);
}
