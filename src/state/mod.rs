//! State management module
//!
//! This module contains the timer engine, the presence tracker and the
//! shared application state that bundles them.

pub mod app_state;
pub mod clock;
pub mod presence;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use presence::{ClientInfo, PresenceTracker, DEFAULT_ACTIVITY_TIMEOUT};
pub use timer_state::{ControlOutcome, CountdownLength, Phase, TimerEngine, TimerState, TimerStatus, Transition};
