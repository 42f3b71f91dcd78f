//! HTTP endpoint handlers

use std::{net::SocketAddr, sync::Arc};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::Json,
};
use tracing::{info, warn};

use crate::{
    access::{client_identity, Access},
    activity::ActivityLog,
    state::{AppState, Transition},
};
use super::{
    error::ApiError,
    requests::parse_start_body,
    responses::{ClientsResponse, HealthResponse, StatusResponse, SuccessResponse, WhitelistResponse},
};

/// Append to the activity log on the blocking pool.
///
/// The write is awaited so entries keep request order.
async fn record_activity<F>(state: &Arc<AppState>, write: F)
where
    F: FnOnce(&ActivityLog) + Send + 'static,
{
    let state = Arc::clone(state);
    if let Err(e) = tokio::task::spawn_blocking(move || write(&state.activity)).await {
        warn!("Activity log task failed: {}", e);
    }
}

/// Identify the caller and decide whether it may control the timer.
///
/// Denials are logged and written to the activity log here, so handlers
/// only need to pass the decision on.
async fn authorize(
    state: &Arc<AppState>,
    headers: &HeaderMap,
    peer: SocketAddr,
    endpoint: &'static str,
) -> (String, Access) {
    let ip = client_identity(headers, peer);
    let access = state.authorize(&ip);
    if !access.is_granted() {
        warn!("Access denied for IP: {} ({})", ip, endpoint);
        let denied_ip = ip.clone();
        record_activity(state, move |log| log.access_denied(&denied_ip, endpoint)).await;
    }
    (ip, access)
}

/// Polls from the control page should not count as a display.
fn is_control_page(headers: &HeaderMap) -> bool {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(|referer| {
            let path = referer.split(['?', '#']).next().unwrap_or_default();
            path.trim_end_matches('/').ends_with("/control")
        })
        .unwrap_or(false)
}

/// Handle GET /api/status - Return timer status and connected display count
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, ApiError> {
    if !is_control_page(&headers) {
        state.presence.record_contact(&client_identity(&headers, peer));
    }

    let status = state.timer.status()?;
    let connected = state.presence.active_count()?;
    Ok(Json(StatusResponse::new(status, connected)))
}

/// Handle POST /api/start - Start a fresh countdown or resume a paused one
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (ip, access) = authorize(&state, &headers, peer, "/api/start").await;
    let length = parse_start_body(&body);

    let outcome = state.timer.start(access, length)?;
    info!(
        "Start request from {}: {}h {}m {}s ({:?})",
        ip, length.hours, length.minutes, length.seconds, outcome.transition
    );
    match outcome.transition {
        Transition::Started => record_activity(&state, move |log| log.timer_set(&ip, length)).await,
        Transition::Resumed => record_activity(&state, move |log| log.resumed(&ip)).await,
        _ => {}
    }
    Ok(Json(SuccessResponse::ok()))
}

/// Handle POST /api/pause - Pause a running countdown
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (ip, access) = authorize(&state, &headers, peer, "/api/pause").await;

    let outcome = state.timer.pause(access)?;
    info!("Pause request from {} ({:?})", ip, outcome.transition);
    if outcome.transition == Transition::Paused {
        record_activity(&state, move |log| log.paused(&ip)).await;
    }
    Ok(Json(SuccessResponse::ok()))
}

/// Handle POST /api/reset - Clear the timer back to idle
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (ip, access) = authorize(&state, &headers, peer, "/api/reset").await;

    state.timer.reset(access)?;
    info!("Reset request from {}", ip);
    record_activity(&state, move |log| log.reset(&ip)).await;
    Ok(Json(SuccessResponse::ok()))
}

/// Handle GET /api/clients - List connected displays
pub async fn clients_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<ClientsResponse>, ApiError> {
    let (_, access) = authorize(&state, &headers, peer, "/api/clients").await;
    let clients = state.presence.active_list(access)?;
    Ok(Json(ClientsResponse::new(clients)))
}

/// Handle GET /api/whitelist - Show the configured allow-list
pub async fn whitelist_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<WhitelistResponse>, ApiError> {
    let (ip, access) = authorize(&state, &headers, peer, "/api/whitelist").await;
    access.require()?;

    Ok(Json(WhitelistResponse {
        whitelist: state.allow_list.entries().to_vec(),
        your_ip: ip,
        access: "granted".to_string(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.get_uptime()))
}
