//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{ClientInfo, TimerStatus};

/// Response for `/api/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub paused: bool,
    /// Seconds, fractional while running
    pub remaining: f64,
    pub finished: bool,
    /// Whole seconds
    pub total: u64,
    pub connected_clients: usize,
}

impl StatusResponse {
    pub fn new(status: TimerStatus, connected_clients: usize) -> Self {
        Self {
            running: status.running,
            paused: status.paused,
            remaining: status.remaining.as_secs_f64(),
            finished: status.finished,
            total: status.total.as_secs(),
            connected_clients,
        }
    }
}

/// Response for accepted control requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response for `/api/clients`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientsResponse {
    pub connected_count: usize,
    pub clients: Vec<ClientInfo>,
}

impl ClientsResponse {
    pub fn new(clients: Vec<ClientInfo>) -> Self {
        Self {
            connected_count: clients.len(),
            clients,
        }
    }
}

/// Response for `/api/whitelist`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistResponse {
    pub whitelist: Vec<String>,
    pub your_ip: String,
    pub access: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok(uptime: String) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
        }
    }
}
