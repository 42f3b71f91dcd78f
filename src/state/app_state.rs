//! Main application state management

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use super::{Clock, PresenceTracker, SystemClock, TimerEngine};
use crate::{
    access::{Access, AllowList},
    activity::ActivityLog,
    config::Config,
};

/// Everything a request handler needs, shared as `Arc<AppState>`.
///
/// The timer and the presence tracker each guard their own state and never
/// call into each other.
#[derive(Debug)]
pub struct AppState {
    pub timer: TimerEngine,
    pub presence: PresenceTracker,
    pub allow_list: AllowList,
    pub activity: ActivityLog,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        allow_list: AllowList,
        activity: ActivityLog,
        presence_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            timer: TimerEngine::new(Arc::clone(&clock)),
            presence: PresenceTracker::new(presence_timeout, clock),
            allow_list,
            activity,
            start_time: Instant::now(),
        }
    }

    /// Build the production state from CLI configuration.
    pub fn from_config(config: &Config, allow_list: AllowList) -> Self {
        let activity = if config.no_activity_log {
            ActivityLog::disabled()
        } else {
            ActivityLog::new(&config.activity_log)
        };

        Self::new(
            allow_list,
            activity,
            config.presence_timeout(),
            Arc::new(SystemClock),
        )
    }

    /// Authorization decision for a caller identity.
    pub fn authorize(&self, ip: &str) -> Access {
        self.allow_list.check(ip)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }
}

fn format_uptime(duration: Duration) -> String {
    let hours = duration.as_secs() / 3600;
    let minutes = (duration.as_secs() % 3600) / 60;
    let seconds = duration.as_secs() % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
