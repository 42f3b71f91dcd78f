//! Caller identity extraction

use std::net::SocketAddr;
use axum::http::HeaderMap;

/// Identity of the caller: the first `X-Forwarded-For` hop, else
/// `X-Real-IP`, else the peer address of the connection.
pub fn client_identity(headers: &HeaderMap, peer: SocketAddr) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_canonical().to_string())
}
