//! Client flow against a live aggregator: activation, filter changes and
//! rendering through `HttpHeatmapSource`.

use heatmap_core::DeviceFilter;
use integration_tests::{fixtures, setup::TestContext};
use overlay::{
    ControllerError, DayWindow, DensityOverlay, FilterController, GridChoice, History,
    HttpHeatmapSource, MemoryHistory, MemorySurface, ViewState, ViewportState,
};
use url::Url;

type Controller = FilterController<MemoryHistory, MemorySurface, ViewportState>;

const DESKTOP_WIDTH: u32 = 1280;

fn controller(page_url: &str) -> Controller {
    // Document no taller than the viewport, so every cell is on screen.
    let viewport = ViewportState::new(DESKTOP_WIDTH, 800);
    FilterController::new(
        MemoryHistory::new(Url::parse(page_url).unwrap()),
        DensityOverlay::new(MemorySurface::attached(), viewport),
    )
}

async fn serve(ctx: &TestContext) -> Url {
    let addr = ctx.spawn().await;
    Url::parse(&format!("http://{}", addr)).unwrap()
}

#[tokio::test]
async fn test_activation_fetches_and_renders() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::device_clicks("/blog/hello", "desktop", 6));
    ctx.seed(fixtures::device_clicks("/blog/hello", "mobile", 4));
    let source = HttpHeatmapSource::new(serve(&ctx).await).with_token(fixtures::test_token());

    let mut controller = controller("https://site.dev/blog/hello?heatmap=true");
    let pending = controller
        .activate_if_requested(DESKTOP_WIDTH)
        .expect("marker should activate");
    assert_eq!(pending.query.page_path, "/blog/hello");
    assert_eq!(pending.query.device, DeviceFilter::Desktop);

    assert!(controller.execute(&source, pending).await);

    let ViewState::Ready(stats) = controller.state() else {
        panic!("expected Ready, got {:?}", controller.state());
    };
    assert_eq!(stats.total_clicks, 6);
    assert!(controller.overlay().is_mounted());
    assert!(controller.overlay().surface().presents() >= 1);
    let frame = controller.overlay().surface().frame().unwrap();
    assert!(!frame.is_clear());
}

#[tokio::test]
async fn test_filter_changes_refetch() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::device_clicks("/pricing", "desktop", 3));
    let source = HttpHeatmapSource::new(serve(&ctx).await).with_token(fixtures::test_token());

    let mut controller = controller("https://site.dev/pricing?heatmap=true");
    let pending = controller.activate_if_requested(DESKTOP_WIDTH).unwrap();
    controller.execute(&source, pending).await;
    assert!(matches!(controller.state(), ViewState::Ready(_)));

    // No mobile clicks: an empty result is not an error.
    let pending = controller.set_device(DeviceFilter::Mobile).unwrap();
    assert!(controller.execute(&source, pending).await);
    let ViewState::Empty(stats) = controller.state() else {
        panic!("expected Empty, got {:?}", controller.state());
    };
    assert_eq!(stats.filtered_by.device, DeviceFilter::Mobile);
    assert!(!controller.overlay().is_mounted());

    let pending = controller.set_grid(GridChoice::Fine).unwrap();
    assert_eq!(pending.query.grid, 300);
    controller.execute(&source, pending).await;
    let pending = controller.set_device(DeviceFilter::All).unwrap();
    controller.execute(&source, pending).await;
    let ViewState::Ready(stats) = controller.state() else {
        panic!("expected Ready, got {:?}", controller.state());
    };
    assert_eq!(stats.grid_size.get(), 300);
}

#[tokio::test]
async fn test_superseded_response_is_ignored() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::device_clicks("/", "desktop", 5));
    let source = HttpHeatmapSource::new(serve(&ctx).await).with_token(fixtures::test_token());

    let mut controller = controller("https://site.dev/?heatmap=true");
    let first = controller.activate_if_requested(DESKTOP_WIDTH).unwrap();
    let second = controller.set_days(DayWindow::Week).unwrap();

    assert!(!controller.execute(&source, first).await);
    assert!(controller.state().is_loading());

    assert!(controller.execute(&source, second).await);
    let ViewState::Ready(stats) = controller.state() else {
        panic!("expected Ready, got {:?}", controller.state());
    };
    assert_eq!(stats.date_range.days, 7);
}

#[tokio::test]
async fn test_signed_out_source_reports_auth_required() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::device_clicks("/", "desktop", 5));
    let source = HttpHeatmapSource::new(serve(&ctx).await);

    let mut controller = controller("https://site.dev/?heatmap=true");
    let pending = controller.activate_if_requested(DESKTOP_WIDTH).unwrap();
    controller.execute(&source, pending).await;

    assert_eq!(controller.state(), &ViewState::Error(ControllerError::AuthRequired));
    assert!(ctx.store.pages_requested().is_empty());
}

#[tokio::test]
async fn test_rejected_token_reports_auth_required() {
    let ctx = TestContext::new();
    let source = HttpHeatmapSource::new(serve(&ctx).await).with_token("not a valid token!");

    let mut controller = controller("https://site.dev/?heatmap=true");
    let pending = controller.activate_if_requested(DESKTOP_WIDTH).unwrap();
    controller.execute(&source, pending).await;

    assert_eq!(controller.state(), &ViewState::Error(ControllerError::AuthRequired));
}

#[tokio::test]
async fn test_deactivate_strips_marker_and_clears() {
    let ctx = TestContext::new();
    ctx.seed(fixtures::device_clicks("/docs", "desktop", 2));
    let source = HttpHeatmapSource::new(serve(&ctx).await).with_token(fixtures::test_token());

    let mut controller = controller("https://site.dev/docs?heatmap=true&tab=api");
    let pending = controller.activate_if_requested(DESKTOP_WIDTH).unwrap();
    controller.execute(&source, pending).await;
    assert!(controller.overlay().is_mounted());

    controller.deactivate();

    assert_eq!(controller.state(), &ViewState::Inactive);
    assert!(!controller.overlay().is_mounted());
    assert!(controller.overlay().surface().frame().is_none());
    assert_eq!(
        controller.history().current_url().as_str(),
        "https://site.dev/docs?tab=api"
    );
    assert!(!controller.refresh(&source).await);
}
