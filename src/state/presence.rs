//! Display presence tracking
//!
//! Displays poll the status endpoint every second or so. A display counts as
//! connected while its last contact is within the activity timeout. Stale
//! entries are purged at the top of every query instead of by a sweeper task.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::clock::Clock;
use crate::{access::Access, error::ControlError};

/// Default window after which a silent client is considered gone.
pub const DEFAULT_ACTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Detail row for a connected client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip: String,
    /// Local wall-clock time of the last contact, `HH:MM:SS`
    pub last_seen: String,
    pub seconds_ago: u64,
}

#[derive(Debug)]
pub struct PresenceTracker {
    clients: Mutex<HashMap<String, Instant>>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl PresenceTracker {
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            timeout,
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Instant>>, ControlError> {
        self.clients.lock().map_err(|_| ControlError::LockPoisoned("presence"))
    }

    fn purge(&self, clients: &mut HashMap<String, Instant>, now: Instant) {
        let before = clients.len();
        clients.retain(|_, last| now.saturating_duration_since(*last) <= self.timeout);
        if clients.len() != before {
            debug!("Dropped {} stale clients", before - clients.len());
        }
    }

    /// Note that `identity` was seen just now.
    pub fn record_contact(&self, identity: &str) {
        let now = self.clock.now();
        match self.lock() {
            Ok(mut clients) => {
                if clients.insert(identity.to_string(), now).is_none() {
                    debug!("New client connected: {}", identity);
                }
            }
            Err(e) => error!("Dropping contact from {}: {}", identity, e),
        }
    }

    /// Number of clients seen within the timeout.
    pub fn active_count(&self) -> Result<usize, ControlError> {
        let now = self.clock.now();
        let mut clients = self.lock()?;
        self.purge(&mut clients, now);
        Ok(clients.len())
    }

    /// Connected clients, sorted by identity. Requires control access.
    pub fn active_list(&self, access: Access) -> Result<Vec<ClientInfo>, ControlError> {
        access.require()?;
        let now = self.clock.now();
        let wall_now = self.clock.wall_now();
        let mut clients = self.lock()?;
        self.purge(&mut clients, now);

        let mut list: Vec<ClientInfo> = clients
            .iter()
            .map(|(ip, last)| {
                let ago = now.saturating_duration_since(*last);
                let ago_wall = chrono::Duration::from_std(ago).unwrap_or_else(|_| chrono::Duration::zero());
                ClientInfo {
                    ip: ip.clone(),
                    last_seen: (wall_now - ago_wall).format("%H:%M:%S").to_string(),
                    seconds_ago: ago.as_secs(),
                }
            })
            .collect();
        list.sort_by(|a, b| a.ip.cmp(&b.ip));
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::clock::ManualClock;

    fn tracker() -> (Arc<ManualClock>, PresenceTracker) {
        let clock = Arc::new(ManualClock::new());
        let tracker = PresenceTracker::new(DEFAULT_ACTIVITY_TIMEOUT, clock.clone());
        (clock, tracker)
    }

    #[test]
    fn test_recorded_client_is_active() {
        let (_, tracker) = tracker();
        tracker.record_contact("10.0.0.1");
        assert_eq!(tracker.active_count().unwrap(), 1);

        let list = tracker.active_list(Access::Granted).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].ip, "10.0.0.1");
        assert_eq!(list[0].seconds_ago, 0);
    }

    #[test]
    fn test_repeat_contact_does_not_duplicate() {
        let (_, tracker) = tracker();
        tracker.record_contact("10.0.0.1");
        tracker.record_contact("10.0.0.1");
        tracker.record_contact("10.0.0.2");
        assert_eq!(tracker.active_count().unwrap(), 2);
    }

    #[test]
    fn test_client_expires_after_timeout() {
        let (clock, tracker) = tracker();
        tracker.record_contact("10.0.0.1");

        clock.advance(Duration::from_secs(10));
        assert_eq!(tracker.active_count().unwrap(), 1, "timeout boundary is inclusive");

        clock.advance(Duration::from_secs(1));
        assert_eq!(tracker.active_count().unwrap(), 0);
        assert!(tracker.active_list(Access::Granted).unwrap().is_empty());
    }

    #[test]
    fn test_refresh_keeps_client_alive() {
        let (clock, tracker) = tracker();
        tracker.record_contact("10.0.0.1");
        tracker.record_contact("10.0.0.2");
        for _ in 0..5 {
            clock.advance(Duration::from_secs(6));
            tracker.record_contact("10.0.0.1");
        }
        let list = tracker.active_list(Access::Granted).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].ip, "10.0.0.1");
    }

    #[test]
    fn test_list_reports_age_and_is_sorted() {
        let (clock, tracker) = tracker();
        tracker.record_contact("10.0.0.9");
        clock.advance(Duration::from_secs(4));
        tracker.record_contact("10.0.0.1");
        clock.advance(Duration::from_secs(2));

        let list = tracker.active_list(Access::Granted).unwrap();
        assert_eq!(list[0].ip, "10.0.0.1");
        assert_eq!(list[0].seconds_ago, 2);
        assert_eq!(list[1].ip, "10.0.0.9");
        assert_eq!(list[1].seconds_ago, 6);

        let expected = (clock.wall_now() - chrono::Duration::seconds(6)).format("%H:%M:%S").to_string();
        assert_eq!(list[1].last_seen, expected);
    }

    #[test]
    fn test_denied_list_does_not_purge() {
        let (clock, tracker) = tracker();
        tracker.record_contact("10.0.0.1");
        clock.advance(Duration::from_secs(11));

        assert_eq!(tracker.active_list(Access::Denied), Err(ControlError::Unauthorized));
        assert_eq!(tracker.clients.lock().unwrap().len(), 1);
    }
}
