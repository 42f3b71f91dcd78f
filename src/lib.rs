//! Countdown Server - A shared countdown timer served over HTTP
//!
//! Display clients poll the timer status while allow-listed control clients
//! start, pause and reset it. The library holds the timer state machine,
//! display presence tracking, access control and the HTTP API around them.

pub mod access;
pub mod activity;
pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod shutdown;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use shutdown::shutdown_signal;
