//! Common test setup functions.

use api::{router, AppState, HeatmapSettings};
use axum::Router;
use clickhouse_client::{health::init_schema, ClickEventStore, ClickHouseClient, MemoryClickStore};
use heatmap_core::ClickEvent;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::containers::TestContainers;

/// Router over an in-memory click store, with mock auth.
pub struct TestContext {
    pub store: MemoryClickStore,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(HeatmapSettings::default())
    }

    pub fn with_settings(settings: HeatmapSettings) -> Self {
        let store = MemoryClickStore::new();
        let state = AppState::with_settings(
            Arc::new(store.clone()) as Arc<dyn ClickEventStore>,
            "mock",
            settings,
        );
        Self {
            store,
            router: router(state),
        }
    }

    pub fn seed(&self, events: Vec<ClickEvent>) {
        self.store.insert(events);
    }

    /// Serve the router on an ephemeral local port.
    pub async fn spawn(&self) -> SocketAddr {
        spawn_router(self.router.clone()).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Router over a real ClickHouse (testcontainer or `HEATMAP_TEST_CLICKHOUSE_URL`).
pub struct ClickHouseContext {
    pub containers: TestContainers,
    pub clickhouse: Arc<ClickHouseClient>,
    pub router: Router,
}

impl ClickHouseContext {
    pub async fn new() -> Self {
        Self::with_settings(HeatmapSettings::default()).await
    }

    pub async fn with_settings(settings: HeatmapSettings) -> Self {
        let containers = TestContainers::start().await;

        let clickhouse = Arc::new(ClickHouseClient::new(containers.clickhouse_config()));

        init_schema(&clickhouse)
            .await
            .expect("Failed to initialize schema");

        let state = AppState::with_settings(clickhouse.clone(), "mock", settings);

        Self {
            containers,
            clickhouse,
            router: router(state),
        }
    }

    /// A client pointed at a database that was never created.
    pub fn unprovisioned_client(&self) -> ClickHouseClient {
        self.clickhouse.for_database("heatmap_missing")
    }
}

/// Serve `router` on 127.0.0.1 with an OS-assigned port.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}
