//! Countdown timer state machine
//!
//! Remaining time is never ticked down by a background task. It is computed
//! from the clock whenever the timer is observed, so the engine only needs
//! to remember how much time was left at the last transition and when the
//! current run started.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use tracing::{debug, info};

use super::clock::Clock;
use crate::{access::Access, error::ControlError};

/// Timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Requested countdown length for a fresh start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountdownLength {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CountdownLength {
    pub fn new(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self { hours, minutes, seconds }
    }

    pub fn total(&self) -> Duration {
        let secs = self
            .hours
            .saturating_mul(3600)
            .saturating_add(self.minutes.saturating_mul(60))
            .saturating_add(self.seconds);
        Duration::from_secs(secs)
    }
}

/// Mutable timer state, only ever touched under the engine lock.
#[derive(Debug, Clone)]
pub struct TimerState {
    pub total_duration: Duration,
    /// Remaining time as of the last start, pause or reset.
    pub remaining: Duration,
    pub phase: Phase,
    /// Set only while running.
    pub run_started_at: Option<Instant>,
}

impl TimerState {
    /// Create a new idle timer state
    pub fn new() -> Self {
        Self {
            total_duration: Duration::ZERO,
            remaining: Duration::ZERO,
            phase: Phase::Idle,
            run_started_at: None,
        }
    }

    /// Remaining time as seen at `now`.
    pub fn live_remaining(&self, now: Instant) -> Duration {
        match (self.phase, self.run_started_at) {
            (Phase::Running, Some(started)) => {
                self.remaining.saturating_sub(now.saturating_duration_since(started))
            }
            _ => self.remaining,
        }
    }

    /// Flip a running timer whose time is up to Finished.
    ///
    /// Returns true if the flip happened on this call.
    pub fn latch_if_expired(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Running || !self.live_remaining(now).is_zero() {
            return false;
        }
        self.phase = Phase::Finished;
        self.remaining = Duration::ZERO;
        self.run_started_at = None;
        true
    }

    fn start_fresh(&mut self, length: CountdownLength, now: Instant) {
        self.total_duration = length.total();
        self.remaining = self.total_duration;
        if self.remaining.is_zero() {
            self.phase = Phase::Idle;
            self.run_started_at = None;
        } else {
            self.phase = Phase::Running;
            self.run_started_at = Some(now);
        }
    }

    pub fn snapshot(&self, now: Instant) -> TimerStatus {
        TimerStatus {
            phase: self.phase,
            running: self.phase == Phase::Running,
            paused: self.phase == Phase::Paused,
            remaining: self.live_remaining(now),
            finished: self.phase == Phase::Finished,
            total: self.total_duration,
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStatus {
    pub phase: Phase,
    pub running: bool,
    pub paused: bool,
    pub remaining: Duration,
    pub finished: bool,
    pub total: Duration,
}

/// What a control operation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new countdown began.
    Started,
    /// A paused countdown continued.
    Resumed,
    Paused,
    Reset,
    /// A zero-length start left the timer idle.
    Cleared,
    /// The operation had no effect in the current phase.
    Ignored,
}

/// Result of a control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOutcome {
    pub transition: Transition,
    pub status: TimerStatus,
}

/// Shared countdown timer.
#[derive(Debug)]
pub struct TimerEngine {
    state: Mutex<TimerState>,
    clock: Arc<dyn Clock>,
}

impl TimerEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(TimerState::new()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TimerState>, ControlError> {
        self.state.lock().map_err(|_| ControlError::LockPoisoned("timer"))
    }

    fn latch(state: &mut TimerState, now: Instant) {
        if state.latch_if_expired(now) {
            info!("Timer finished!");
        }
    }

    /// Start a fresh countdown, or resume a paused one.
    ///
    /// While paused with time left, `length` is ignored. While paused with
    /// nothing left the call counts as a fresh start. A running timer is left
    /// untouched.
    pub fn start(&self, access: Access, length: CountdownLength) -> Result<ControlOutcome, ControlError> {
        access.require()?;
        let now = self.clock.now();
        let mut state = self.lock()?;
        Self::latch(&mut state, now);

        let phase = state.phase;
        let transition = match phase {
            Phase::Running => {
                debug!("Start ignored, timer already running");
                Transition::Ignored
            }
            Phase::Paused if !state.remaining.is_zero() => {
                state.phase = Phase::Running;
                state.run_started_at = Some(now);
                info!("Timer resumed: {} seconds remaining", state.remaining.as_secs_f64());
                Transition::Resumed
            }
            _ => {
                state.start_fresh(length, now);
                if state.phase == Phase::Running {
                    info!("Timer started: {} seconds remaining", state.remaining.as_secs());
                    Transition::Started
                } else {
                    debug!("Start with zero duration, timer stays idle");
                    Transition::Cleared
                }
            }
        };

        Ok(ControlOutcome { transition, status: state.snapshot(now) })
    }

    /// Freeze a running countdown. No-op in every other phase.
    pub fn pause(&self, access: Access) -> Result<ControlOutcome, ControlError> {
        access.require()?;
        let now = self.clock.now();
        let mut state = self.lock()?;
        Self::latch(&mut state, now);

        let transition = if state.phase == Phase::Running {
            state.remaining = state.live_remaining(now);
            state.phase = Phase::Paused;
            state.run_started_at = None;
            info!("Timer paused: {} seconds remaining", state.remaining.as_secs_f64());
            Transition::Paused
        } else {
            debug!("Pause ignored, timer is {:?}", state.phase);
            Transition::Ignored
        };

        Ok(ControlOutcome { transition, status: state.snapshot(now) })
    }

    /// Return to Idle with zero total, from any phase.
    pub fn reset(&self, access: Access) -> Result<ControlOutcome, ControlError> {
        access.require()?;
        let now = self.clock.now();
        let mut state = self.lock()?;
        *state = TimerState::new();
        info!("Timer reset");
        Ok(ControlOutcome { transition: Transition::Reset, status: state.snapshot(now) })
    }

    /// Current timer status.
    ///
    /// This read has exactly one side effect: a running timer whose time is
    /// up is switched to Finished here, since nothing else watches the clock.
    pub fn status(&self) -> Result<TimerStatus, ControlError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        Self::latch(&mut state, now);
        Ok(state.snapshot(now))
    }
}
