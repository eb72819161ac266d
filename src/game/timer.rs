//! Countdown timer
//!
//! Remaining time is always derived from the start instant, never
//! accumulated from tick deltas, so a late or skipped tick cannot make drift
//! compound. The timer is driven externally: the owner calls [`CountdownTimer::tick`]
//! on its polling cadence and reacts to the single [`TimerTick::Expired`].

use std::time::Duration;

use tokio::time::Instant;

/// Lifecycle of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// Result of polling the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Still counting down
    Remaining(u64),
    /// Reached zero on this tick; never reported twice
    Expired,
    /// Not running (never started, cancelled, or already expired)
    Inactive,
}

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    duration: Duration,
    started_at: Option<Instant>,
    remaining_ms: u64,
    state: TimerState,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            duration: Duration::ZERO,
            started_at: None,
            remaining_ms: 0,
            state: TimerState::Idle,
        }
    }

    /// Arm the timer; re-arming replaces any previous countdown
    pub fn start(&mut self, duration_ms: u64, now: Instant) {
        self.duration = Duration::from_millis(duration_ms);
        self.started_at = Some(now);
        self.remaining_ms = duration_ms;
        self.state = TimerState::Running;
    }

    /// Recompute the remaining time at `now`
    pub fn tick(&mut self, now: Instant) -> TimerTick {
        if self.state != TimerState::Running {
            return TimerTick::Inactive;
        }
        let Some(started_at) = self.started_at else {
            return TimerTick::Inactive;
        };

        let elapsed = now.saturating_duration_since(started_at);
        let left = self.duration.saturating_sub(elapsed).as_millis() as u64;

        // Never move backwards, even if the caller hands us an older instant
        self.remaining_ms = self.remaining_ms.min(left);

        if self.remaining_ms == 0 {
            self.state = TimerState::Expired;
            TimerTick::Expired
        } else {
            TimerTick::Remaining(self.remaining_ms)
        }
    }

    /// Stop without expiring. Safe in every state.
    pub fn cancel(&mut self) {
        if self.state == TimerState::Running || self.state == TimerState::Idle {
            self.state = TimerState::Cancelled;
        }
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn state(&self) -> TimerState {
        self.state
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}
