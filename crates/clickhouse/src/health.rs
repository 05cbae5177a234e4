//! ClickHouse health checks and schema setup.

use crate::client::ClickHouseClient;
use crate::schema::{all_tables, CLICK_EVENTS_TABLE};
use crate::store::{ClickEventStore, StoreError};
use tracing::{debug, error};

/// Check ClickHouse connection health.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    match client.ping().await {
        Ok(()) => {
            debug!("ClickHouse connection healthy");
            true
        }
        Err(e) => {
            error!("ClickHouse health check failed: {}", e);
            false
        }
    }
}

/// Whether the click table exists.
pub async fn is_provisioned(client: &ClickHouseClient) -> Result<bool, StoreError> {
    let exists: u8 = client
        .inner()
        .query(&format!("EXISTS TABLE {}", CLICK_EVENTS_TABLE))
        .fetch_one()
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
    Ok(exists == 1)
}

/// Create the click table if missing.
pub async fn init_schema(client: &ClickHouseClient) -> Result<(), StoreError> {
    for ddl in all_tables() {
        client
            .inner()
            .query(ddl)
            .execute()
            .await
            .map_err(|e| StoreError::Query(format!("Failed to execute DDL: {}", e)))?;
    }

    debug!("ClickHouse schema initialized");
    Ok(())
}
