//! HTTP API integration tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`. Peer
//! addresses come from `MockConnectInfo` and time from a `ManualClock`, so
//! nothing here sleeps or binds a socket.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use countdown_server::{
    access::AllowList,
    activity::ActivityLog,
    api::create_router,
    state::{AppState, ManualClock},
};

// ============================================================================
// Test Helpers
// ============================================================================

const CONTROL_PEER: [u8; 4] = [10, 1, 10, 5];
const DISPLAY_PEER: [u8; 4] = [192, 168, 50, 20];

fn create_state(clock: Arc<ManualClock>, activity: ActivityLog) -> Arc<AppState> {
    Arc::new(AppState::new(
        AllowList::new(["10.1.10.0/24"]),
        activity,
        Duration::from_secs(10),
        clock,
    ))
}

fn app_for(state: &Arc<AppState>, peer: [u8; 4]) -> Router {
    create_router(Arc::clone(state)).layer(MockConnectInfo(SocketAddr::from((peer, 40000))))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Status
// ============================================================================

#[tokio::test]
async fn status_of_fresh_server_is_idle() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let display = app_for(&state, DISPLAY_PEER);

    let (status, body) = send(&display, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "running": false,
            "paused": false,
            "remaining": 0.0,
            "finished": false,
            "total": 0,
            "connected_clients": 1
        })
    );
}

#[tokio::test]
async fn start_countdown_and_watch_it_finish() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock.clone(), ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);
    let display = app_for(&state, DISPLAY_PEER);

    let (status, body) = send(&control, post("/api/start", json!({"seconds": 5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    clock.advance(Duration::from_secs(3));
    let (_, body) = send(&display, get("/api/status")).await;
    assert_eq!(body["remaining"], json!(2.0));
    assert_eq!(body["finished"], json!(false));
    assert_eq!(body["running"], json!(true));
    assert_eq!(body["total"], json!(5));

    clock.advance(Duration::from_secs(3));
    let (_, body) = send(&display, get("/api/status")).await;
    assert_eq!(body["remaining"], json!(0.0));
    assert_eq!(body["finished"], json!(true));
    assert_eq!(body["running"], json!(false));
}

#[tokio::test]
async fn pause_then_resume_via_api() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock.clone(), ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);

    send(&control, post("/api/start", json!({"hours": 0, "minutes": 1, "seconds": 0}))).await;
    clock.advance(Duration::from_secs(20));
    let (status, _) = send(&control, post_empty("/api/pause")).await;
    assert_eq!(status, StatusCode::OK);

    clock.advance(Duration::from_secs(300));
    let (_, body) = send(&control, get("/api/status")).await;
    assert_eq!(body["paused"], json!(true));
    assert_eq!(body["remaining"], json!(40.0));

    send(&control, post("/api/start", json!({}))).await;
    clock.advance(Duration::from_secs(10));
    let (_, body) = send(&control, get("/api/status")).await;
    assert_eq!(body["running"], json!(true));
    assert_eq!(body["remaining"], json!(30.0));
    assert_eq!(body["total"], json!(60));
}

#[tokio::test]
async fn reset_returns_to_idle() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);

    send(&control, post("/api/start", json!({"minutes": 3}))).await;
    let (status, _) = send(&control, post_empty("/api/reset")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&control, get("/api/status")).await;
    assert_eq!(body["running"], json!(false));
    assert_eq!(body["paused"], json!(false));
    assert_eq!(body["finished"], json!(false));
    assert_eq!(body["remaining"], json!(0.0));
    assert_eq!(body["total"], json!(0));
}

#[tokio::test]
async fn malformed_start_fields_are_coerced() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);

    let (status, _) = send(
        &control,
        post("/api/start", json!({"hours": "x", "minutes": "2", "seconds": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&control, get("/api/status")).await;
    assert_eq!(body["total"], json!(120));
}

#[tokio::test]
async fn start_without_body_keeps_timer_idle() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);

    let (status, _) = send(&control, post_empty("/api/start")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&control, get("/api/status")).await;
    assert_eq!(body["running"], json!(false));
    assert_eq!(body["total"], json!(0));
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn denied_control_requests_change_nothing() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock.clone(), ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);
    let display = app_for(&state, DISPLAY_PEER);

    send(&control, post("/api/start", json!({"seconds": 30}))).await;
    clock.advance(Duration::from_secs(4));
    let (_, before) = send(&display, get("/api/status")).await;

    for request in [
        post("/api/start", json!({"hours": 2})),
        post_empty("/api/pause"),
        post_empty("/api/reset"),
        get("/api/clients"),
        get("/api/whitelist"),
    ] {
        let (status, body) = send(&display, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Access denied"}));
    }

    let (_, after) = send(&display, get("/api/status")).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn forwarded_for_header_decides_access() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let display = app_for(&state, DISPLAY_PEER);

    let request = Request::builder()
        .method("POST")
        .uri("/api/reset")
        .header("x-forwarded-for", "10.1.10.77, 192.168.50.20")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&display, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn whitelist_reports_entries_and_caller() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);

    let (status, body) = send(&control, get("/api/whitelist")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "whitelist": ["10.1.10.0/24"],
            "your_ip": "10.1.10.5",
            "access": "granted"
        })
    );
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn displays_are_tracked_until_they_go_quiet() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock.clone(), ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);
    let display = app_for(&state, DISPLAY_PEER);

    send(&display, get("/api/status")).await;
    clock.advance(Duration::from_secs(2));

    let (status, body) = send(&control, get("/api/clients")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected_count"], json!(1));
    assert_eq!(body["clients"][0]["ip"], json!("192.168.50.20"));
    assert_eq!(body["clients"][0]["seconds_ago"], json!(2));
    assert_eq!(body["clients"][0]["last_seen"].as_str().unwrap().len(), 8);

    clock.advance(Duration::from_secs(9));
    let (_, body) = send(&control, get("/api/clients")).await;
    assert_eq!(body["connected_count"], json!(0));
    assert_eq!(body["clients"], json!([]));
}

#[tokio::test]
async fn control_page_polls_are_not_counted() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let control = app_for(&state, CONTROL_PEER);

    let request = Request::builder()
        .uri("/api/status")
        .header("referer", "http://timer.local/control")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&control, request).await;
    assert_eq!(body["connected_clients"], json!(0));
}

// ============================================================================
// Activity log & health
// ============================================================================

#[tokio::test]
async fn control_actions_are_written_to_activity_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timer.log");
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::new(&path));
    let control = app_for(&state, CONTROL_PEER);
    let display = app_for(&state, DISPLAY_PEER);

    send(&control, post("/api/start", json!({"hours": 1, "minutes": 30}))).await;
    send(&control, post_empty("/api/pause")).await;
    send(&display, post_empty("/api/reset")).await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("10.1.10.5 set a 1 hour 30 minutes timer via api on "));
    assert!(lines[1].starts_with("10.1.10.5 paused timer via api on "));
    assert!(lines[2].starts_with("192.168.50.20 accessed /api/reset (denied) via api on "));
}

#[tokio::test]
async fn activity_log_skips_requests_that_change_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timer.log");
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock.clone(), ActivityLog::new(&path));
    let control = app_for(&state, CONTROL_PEER);

    send(&control, post("/api/start", json!({"minutes": 5}))).await;
    clock.advance(Duration::from_secs(30));

    // Start while running keeps the first countdown.
    let (status, _) = send(&control, post("/api/start", json!({"hours": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&control, get("/api/status")).await;
    assert_eq!(body["remaining"], json!(270.0));
    assert_eq!(body["total"], json!(300));

    send(&control, post_empty("/api/pause")).await;
    send(&control, post("/api/start", json!({}))).await;
    send(&control, post_empty("/api/reset")).await;
    send(&control, post_empty("/api/pause")).await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4, "unexpected log: {:?}", lines);
    assert!(lines[0].starts_with("10.1.10.5 set a 5 minutes timer via api on "));
    assert!(lines[1].starts_with("10.1.10.5 paused timer via api on "));
    assert!(lines[2].starts_with("10.1.10.5 resumed timer via api on "));
    assert!(lines[3].starts_with("10.1.10.5 reset timer via api on "));
}

#[tokio::test]
async fn health_reports_ok() {
    let clock = Arc::new(ManualClock::new());
    let state = create_state(clock, ActivityLog::disabled());
    let display = app_for(&state, DISPLAY_PEER);

    let (status, body) = send(&display, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}
