//! Tests for health check endpoints.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::setup::TestContext;
use telemetry::health;

fn server() -> TestServer {
    let ctx = TestContext::new();
    TestServer::new(ctx.router).expect("Failed to create test server")
}

/// /health reports store connectivity, provisioning and in-flight requests
#[tokio::test]
async fn test_health_endpoint_structure() {
    let response = server().get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    for field in [
        "status",
        "click_store_connected",
        "click_store_provisioned",
        "active_requests",
    ] {
        assert!(body.get(field).is_some(), "Response should have '{}' field", field);
    }
    assert!(body["click_store_connected"].is_boolean());
    assert!(body["active_requests"].is_u64() || body["active_requests"].is_i64());
}

#[tokio::test]
async fn test_health_status_is_known() {
    let response = server().get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let status = body["status"].as_str().unwrap_or("");
    assert!(
        matches!(status, "healthy" | "degraded" | "unhealthy"),
        "unexpected status '{}'",
        status
    );
}

/// Ready follows the click store component; this is the only test that
/// touches the global registry state.
#[tokio::test]
async fn test_ready_tracks_click_store() {
    let server = server();

    health().click_store.set_unhealthy("ping failed");
    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    health().click_store.set_healthy();
    health().click_store.set_provisioned(true);
    server.get("/health/ready").await.assert_status_ok();

    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["click_store_connected"], true);
    assert_eq!(body["click_store_provisioned"], true);
}

#[tokio::test]
async fn test_live_endpoint() {
    server().get("/health/live").await.assert_status_ok();
}
