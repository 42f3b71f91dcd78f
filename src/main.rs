//! Countdown Server - A shared countdown timer served over HTTP
//!
//! This is the main entry point for the countdown-server application.

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use countdown_server::{
    access::AllowList,
    api::create_router,
    config::Config,
    state::AppState,
    shutdown::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_server={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, whitelist={}, presence_timeout={}s",
          config.host, config.port, config.whitelist.display(), config.presence_timeout);

    let allow_list = AllowList::load(&config.whitelist);
    allow_list.log_summary();

    // Create application state
    let state = Arc::new(AppState::from_config(&config, allow_list));
    match state.activity.path() {
        Some(path) => info!("Activity log: {}", path.display()),
        None => info!("Activity log disabled"),
    }

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /api/status    - Timer status and connected displays");
    info!("  POST /api/start     - Start or resume the timer (allow-listed)");
    info!("  POST /api/pause     - Pause the timer (allow-listed)");
    info!("  POST /api/reset     - Reset the timer (allow-listed)");
    info!("  GET  /api/clients   - Connected displays (allow-listed)");
    info!("  GET  /api/whitelist - Allow-list entries (allow-listed)");
    info!("  GET  /health        - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>());

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
