//! Handle on the ClickHouse HTTP interface.

use crate::config::ClickHouseConfig;
use clickhouse::Client;
use tracing::info;

/// Cheap to clone; clones share the underlying HTTP connection pool.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Build a client. Nothing is sent until the first query.
    pub fn new(config: ClickHouseConfig) -> Self {
        let mut inner = Client::default()
            .with_url(&config.url)
            .with_database(&config.database)
            .with_option("max_execution_time", config.timeout_secs.to_string());

        if let Some(user) = config.username.as_deref() {
            inner = inner.with_user(user);
        }
        if let Some(password) = config.password.as_deref() {
            inner = inner.with_password(password);
        }

        info!(url = %config.url, database = %config.database, "ClickHouse click store configured");

        Self { inner, config }
    }

    /// Same server and credentials, different database.
    pub fn for_database(&self, database: impl Into<String>) -> Self {
        Self::new(self.config.clone().with_database(database))
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    pub fn database(&self) -> &str {
        &self.config.database
    }
}
