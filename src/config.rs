//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::state::DEFAULT_ACTIVITY_TIMEOUT;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "countdown-server")]
#[command(about = "A shared countdown timer server with allow-listed control")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, env = "PORT", default_value = "80")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// JSON file with extra allow-list entries (addresses or CIDR ranges)
    #[arg(short, long, default_value = "control_whitelist.json")]
    pub whitelist: PathBuf,

    /// File that control actions are appended to
    #[arg(long, default_value = "logs/timer.log")]
    pub activity_log: PathBuf,

    /// Do not write the activity log
    #[arg(long)]
    pub no_activity_log: bool,

    /// Seconds without contact before a display counts as disconnected
    #[arg(long, default_value_t = DEFAULT_ACTIVITY_TIMEOUT.as_secs())]
    pub presence_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn presence_timeout(&self) -> Duration {
        Duration::from_secs(self.presence_timeout)
    }
}
