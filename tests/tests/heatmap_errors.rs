//! Error responses from `GET /heatmap/*page_path`.
//!
//! Every failure carries `{ error, code }` and maps to a fixed status.

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use clickhouse_client::StoreError;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

fn assert_error(response: &TestResponse, status: StatusCode, code: &str) -> Value {
    response.assert_status(status);
    let body: Value = response.json();
    assert_eq!(body["code"], code, "body: {}", body);
    assert!(body["error"].is_string());
    body
}

#[tokio::test]
async fn test_missing_authorization_header() {
    let ctx = TestContext::new();
    let response = server(&ctx).get("/heatmap/%2F").await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "AUTH_001");
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let ctx = TestContext::new();
    let response = server(&ctx)
        .get("/heatmap/%2F")
        .add_header("Authorization", &format!("Basic {}", fixtures::test_token()))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_bearer_token_rejected() {
    let ctx = TestContext::new();
    let response = server(&ctx)
        .get("/heatmap/%2F")
        .add_header("Authorization", "Bearer ")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_is_checked_before_the_store() {
    let ctx = TestContext::new();
    server(&ctx).get("/heatmap/%2F").await;
    assert!(ctx.store.pages_requested().is_empty());
}

#[tokio::test]
async fn test_invalid_device() {
    let ctx = TestContext::new();
    let response = server(&ctx)
        .get("/heatmap/%2F?device=tablet")
        .add_header("Authorization", &fixtures::bearer())
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "VALID_001");
    assert!(ctx.store.pages_requested().is_empty());
}

#[tokio::test]
async fn test_invalid_days() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    for days in ["0", "-3", "week", "4294967296"] {
        let response = server
            .get(&format!("/heatmap/%2F?days={}", days))
            .add_header("Authorization", &fixtures::bearer())
            .await;
        assert_error(&response, StatusCode::BAD_REQUEST, "VALID_001");
    }
}

#[tokio::test]
async fn test_non_numeric_grid() {
    let ctx = TestContext::new();
    let response = server(&ctx)
        .get("/heatmap/%2F?grid=fine")
        .add_header("Authorization", &fixtures::bearer())
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "VALID_001");
}

#[tokio::test]
async fn test_store_failure_is_a_server_error() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::viewport_clicks("/", 3, 0.5, 0.5));
    ctx.store.fail_with(StoreError::Query("connection reset".into()));

    let response = server(&ctx)
        .get("/heatmap/%2F")
        .add_header("Authorization", &fixtures::bearer())
        .await;

    let body = assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "STORE_001");
    assert_eq!(body["error"], "Failed to fetch heatmap data");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_store_recovers_after_failure() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::viewport_clicks("/", 3, 0.5, 0.5));
    let server = server(&ctx);

    ctx.store.fail_with(StoreError::Query("connection reset".into()));
    server
        .get("/heatmap/%2F")
        .add_header("Authorization", &fixtures::bearer())
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    ctx.store.recover();
    let response = server
        .get("/heatmap/%2F")
        .add_header("Authorization", &fixtures::bearer())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["stats"]["totalClicks"], 3);
}
