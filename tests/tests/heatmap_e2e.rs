//! End-to-end tests for `GET /heatmap/*page_path`.
//!
//! Requests go through the real router (auth extractor, validation, store
//! scan, aggregation) backed by the in-memory `MemoryClickStore`.

use api::HeatmapSettings;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use heatmap_core::{ClickProps, GridCell};
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

async fn get_heatmap(server: &TestServer, uri: &str) -> Value {
    let response = server
        .get(uri)
        .add_header("Authorization", &fixtures::bearer())
        .await;
    response.assert_status_ok();
    response.json()
}

fn grid_sum(body: &Value) -> u64 {
    body["grid"]
        .as_object()
        .map(|cells| cells.values().filter_map(Value::as_u64).sum())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_nearby_clicks_merge_into_one_cell() {
    let ctx = TestContext::new();
    ctx.seed(vec![
        fixtures::click("/blog/hello", ClickProps::viewport(0.012, 0.024)),
        fixtures::click("/blog/hello", ClickProps::viewport(0.018, 0.029)),
    ]);

    let body = get_heatmap(&server(&ctx), "/heatmap/%2Fblog%2Fhello?grid=100").await;

    assert_eq!(body["grid"], serde_json::json!({ "1,2": 2 }));
    let clicks = body["clicks"].as_array().unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0]["count"], 2);
    assert_eq!(clicks[0]["gridX"], 1);
    assert_eq!(clicks[0]["gridY"], 2);
    assert!((clicks[0]["x"].as_f64().unwrap() - 0.015).abs() < 1e-9);
    assert!((clicks[0]["y"].as_f64().unwrap() - 0.025).abs() < 1e-9);
}

#[tokio::test]
async fn test_response_shape() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::viewport_clicks("/", 3, 0.5, 0.5));

    let body = get_heatmap(&server(&ctx), "/heatmap/%2F").await;
    let stats = &body["stats"];

    assert_eq!(stats["totalClicks"], 3);
    assert_eq!(stats["originalClicks"], 3);
    assert_eq!(stats["uniqueElements"], 0);
    assert_eq!(stats["gridSize"], 100);
    assert_eq!(stats["coordMode"], "viewport");
    assert_eq!(stats["filteredBy"]["device"], "all");
    assert!(stats["samplingWarning"].is_null());
    assert_eq!(stats["dateRange"]["days"], 30);
    assert!(stats["dateRange"]["from"].is_string());
    assert!(stats["dateRange"]["to"].is_string());
}

#[tokio::test]
async fn test_store_is_read_in_sequential_pages() {
    let ctx = TestContext::with_settings(HeatmapSettings {
        page_size: 10,
        ..HeatmapSettings::default()
    });
    ctx.seed(fixtures::page_clicks("/docs", 25));

    let body = get_heatmap(&server(&ctx), "/heatmap/%2Fdocs").await;

    assert_eq!(body["stats"]["originalClicks"], 25);
    assert_eq!(
        ctx.store.pages_requested(),
        vec![(0, 10), (10, 10), (20, 10)]
    );
}

#[tokio::test]
async fn test_page_path_matches_exactly_after_decoding() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::viewport_clicks("/blog/post", 2, 0.3, 0.3));
    ctx.seed(fixtures::viewport_clicks("/blog/post/", 5, 0.3, 0.3));
    ctx.seed(fixtures::viewport_clicks("/blog/post?ref=x", 7, 0.3, 0.3));

    let server = server(&ctx);
    assert_eq!(
        get_heatmap(&server, "/heatmap/%2Fblog%2Fpost").await["stats"]["totalClicks"],
        2
    );
    assert_eq!(
        get_heatmap(&server, "/heatmap/%2Fblog%2Fpost%2F").await["stats"]["totalClicks"],
        5
    );
    assert_eq!(
        get_heatmap(&server, "/heatmap/%2Fblog%2Fpost%3Fref%3Dx").await["stats"]["totalClicks"],
        7
    );
}

#[tokio::test]
async fn test_device_results_partition_all() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::device_clicks("/shop", "mobile", 9));
    ctx.seed(fixtures::device_clicks("/shop", "desktop", 14));

    let server = server(&ctx);
    let all = get_heatmap(&server, "/heatmap/%2Fshop?device=all").await;
    let mobile = get_heatmap(&server, "/heatmap/%2Fshop?device=mobile").await;
    let desktop = get_heatmap(&server, "/heatmap/%2Fshop?device=desktop").await;

    assert_eq!(mobile["stats"]["originalClicks"], 9);
    assert_eq!(desktop["stats"]["originalClicks"], 14);
    assert_eq!(all["stats"]["originalClicks"], 23);
    assert_eq!(mobile["stats"]["filteredBy"]["device"], "mobile");

    // Cell-wise, mobile + desktop == all.
    let cells = |body: &Value, key: &str| body["grid"][key].as_u64().unwrap_or(0);
    for key in all["grid"].as_object().unwrap().keys() {
        assert_eq!(cells(&mobile, key) + cells(&desktop, key), cells(&all, key));
    }
}

#[tokio::test]
async fn test_unlabelled_clicks_only_count_for_all() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::viewport_clicks("/shop", 4, 0.2, 0.2));
    ctx.seed(fixtures::device_clicks("/shop", "mobile", 3));

    let server = server(&ctx);
    assert_eq!(get_heatmap(&server, "/heatmap/%2Fshop").await["stats"]["totalClicks"], 7);
    assert_eq!(
        get_heatmap(&server, "/heatmap/%2Fshop?device=mobile").await["stats"]["totalClicks"],
        3
    );
}

#[tokio::test]
async fn test_coord_mode_is_page_when_any_click_has_page_coords() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::viewport_clicks("/mixed", 20, 0.4, 0.4));
    ctx.seed(fixtures::page_clicks("/mixed", 1));
    ctx.seed(fixtures::viewport_clicks("/legacy", 5, 0.4, 0.4));

    let server = server(&ctx);
    assert_eq!(get_heatmap(&server, "/heatmap/%2Fmixed").await["stats"]["coordMode"], "page");
    assert_eq!(get_heatmap(&server, "/heatmap/%2Flegacy").await["stats"]["coordMode"], "viewport");
}

#[tokio::test]
async fn test_invalid_coordinates_are_never_binned() {
    let ctx = TestContext::new();
    let raw = [
        serde_json::json!({ "x": 0.5, "y": 0.5 }),
        serde_json::json!({ "x": 1.5, "y": 0.2 }),
        serde_json::json!({ "x": -0.01, "y": 0.2 }),
        serde_json::json!({ "x": 1.0, "y": 0.5 }),
        serde_json::json!({ "x": "left", "y": 0.5 }),
        serde_json::json!({ "y": 0.5 }),
        serde_json::json!({ "page_x": 2.0, "page_y": 0.5, "x": 0.3, "y": 0.3 }),
        serde_json::json!({ "page_x": 0.7, "page_y": 0.7 }),
    ];
    ctx.seed(
        raw.into_iter()
            .map(|props| fixtures::click("/edge", fixtures::raw_props(props)))
            .collect(),
    );

    let body = get_heatmap(&server(&ctx), "/heatmap/%2Fedge?grid=50").await;

    assert_eq!(body["stats"]["originalClicks"], 2);
    assert_eq!(grid_sum(&body), 2);
    for key in body["grid"].as_object().unwrap().keys() {
        let cell: GridCell = key.parse().unwrap();
        assert!(cell.grid_x < 50 && cell.grid_y < 50, "out of range key {}", key);
    }
}

#[tokio::test]
async fn test_grid_size_is_clamped_and_echoed() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::viewport_clicks("/", 1, 0.999, 0.999));
    let server = server(&ctx);

    let body = get_heatmap(&server, "/heatmap/%2F?grid=10").await;
    assert_eq!(body["stats"]["gridSize"], 50);
    assert_eq!(body["grid"]["49,49"], 1);

    let body = get_heatmap(&server, "/heatmap/%2F?grid=100000").await;
    assert_eq!(body["stats"]["gridSize"], 400);
    assert_eq!(body["grid"]["399,399"], 1);

    let body = get_heatmap(&server, "/heatmap/%2F?grid=-5").await;
    assert_eq!(body["stats"]["gridSize"], 50);

    let body = get_heatmap(&server, "/heatmap/%2F?grid=99999999999").await;
    assert_eq!(body["stats"]["gridSize"], 400);
}

#[tokio::test]
async fn test_sampling_keeps_busiest_cells() {
    let ctx = TestContext::with_settings(HeatmapSettings {
        max_bins: 10,
        ..HeatmapSettings::default()
    });
    // 12 distinct cells on the diagonal, the first one clicked three times.
    let mut clicks = fixtures::page_clicks("/busy", 12);
    clicks.extend(fixtures::viewport_clicks("/busy", 2, 0.5 / 12.0, 0.5 / 12.0));
    ctx.seed(clicks);

    let body = get_heatmap(&server(&ctx), "/heatmap/%2Fbusy").await;
    let stats = &body["stats"];

    assert_eq!(body["clicks"].as_array().unwrap().len(), 10);
    assert_eq!(stats["originalClicks"], 14);
    assert!(stats["totalClicks"].as_u64().unwrap() < 14);
    assert_eq!(grid_sum(&body), stats["totalClicks"].as_u64().unwrap());

    let warning = stats["samplingWarning"].as_str().unwrap();
    assert!(warning.contains("12"), "warning: {}", warning);
    assert!(warning.contains("10"), "warning: {}", warning);
    assert_eq!(body["grid"]["4,4"], 3);
}

#[tokio::test]
async fn test_unique_elements() {
    let ctx = TestContext::new();
    ctx.seed(vec![
        fixtures::click("/", ClickProps::viewport(0.1, 0.1).with_element("cta")),
        fixtures::click("/", ClickProps::viewport(0.2, 0.1).with_element("cta")),
        fixtures::click("/", ClickProps::viewport(0.3, 0.1).with_element("nav")),
        fixtures::click("/", ClickProps::viewport(0.4, 0.1)),
    ]);

    let body = get_heatmap(&server(&ctx), "/heatmap/%2F").await;
    assert_eq!(body["stats"]["uniqueElements"], 2);
}

#[tokio::test]
async fn test_time_window() {
    let ctx = TestContext::new();
    let ten_days_ago = Utc::now() - Duration::days(10);
    ctx.seed(vec![
        fixtures::click_at("/", ten_days_ago, ClickProps::viewport(0.5, 0.5)),
        fixtures::click("/", ClickProps::viewport(0.5, 0.5)),
    ]);

    let server = server(&ctx);
    assert_eq!(get_heatmap(&server, "/heatmap/%2F?days=7").await["stats"]["totalClicks"], 1);
    assert_eq!(get_heatmap(&server, "/heatmap/%2F?days=30").await["stats"]["totalClicks"], 2);
}

#[tokio::test]
async fn test_long_time_windows_are_served() {
    let ctx = TestContext::new();
    let twenty_years_ago = Utc::now() - Duration::days(365 * 20);
    ctx.seed(vec![
        fixtures::click_at("/", twenty_years_ago, ClickProps::viewport(0.5, 0.5)),
        fixtures::click("/", ClickProps::viewport(0.5, 0.5)),
    ]);

    let server = server(&ctx);
    let body = get_heatmap(&server, "/heatmap/%2F?days=4000").await;
    assert_eq!(body["stats"]["dateRange"]["days"], 4000);
    assert_eq!(body["stats"]["totalClicks"], 1);

    let uri = format!("/heatmap/%2F?days={}", u32::MAX);
    let body = get_heatmap(&server, &uri).await;
    assert_eq!(body["stats"]["dateRange"]["days"], u32::MAX);
    assert_eq!(body["stats"]["totalClicks"], 2);
}

#[tokio::test]
async fn test_unprovisioned_store_returns_empty_heatmap() {
    let ctx = TestContext::new();
    ctx.store.fail_unprovisioned();

    let body = get_heatmap(&server(&ctx), "/heatmap/%2Fpricing").await;

    assert_eq!(body["clicks"], serde_json::json!([]));
    assert_eq!(body["grid"], serde_json::json!({}));
    assert_eq!(body["stats"]["totalClicks"], 0);
    assert!(body["stats"]["samplingWarning"].is_null());
}
