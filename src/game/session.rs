//! Round session state machine
//!
//! `idle -> running -> finished -> idle` is the only path. The session owns
//! the countdown and the spawn source; it never talks to the network itself.
//! The controller asks it for permission (`begin_start`, `claim_finish`) before
//! every request, which keeps start and finish single-flight.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::game::reconcile::FinishSubmission;
use crate::game::spawn::{SpawnSource, SpawnTarget, BONUS_TRACKED_KIND};
use crate::game::timer::{CountdownTimer, TimerTick};
use crate::net::backend::ApiError;
use crate::net::protocol::StartedRound;

/// Server-issued round identifier, echoed back in the shape it arrived in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionId {
    Numeric(i64),
    Text(String),
}

impl SessionId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(SessionId::Numeric),
            Value::String(s) if !s.is_empty() => Some(SessionId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Numeric(id) => write!(f, "{}", id),
            SessionId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Idle,
    Running,
    Finished,
}

/// Why a round operation was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("A round is already running")]
    AlreadyRunning,
    #[error("A start request is already in flight")]
    StartInFlight,
    #[error("The previous round is still being reconciled")]
    ReconciliationInFlight,
    #[error("Round controller has been shut down")]
    ShutDown,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result of a catch that landed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatchOutcome {
    pub points: u32,
    pub score: u64,
    pub next: SpawnTarget,
}

/// What a countdown poll changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTick {
    Remaining(u64),
    /// `running -> finished` happened on this poll
    Expired,
}

/// Display-only projection of the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub status: RoundStatus,
    pub score: u64,
    pub best_score: Option<u64>,
    pub remaining_ms: u64,
    /// Whole seconds left, rounded up; only while running
    pub seconds_left: Option<u64>,
    /// Fraction of the round remaining, in `[0, 1]`
    pub progress: f64,
}

pub struct RoundSession {
    session_id: Option<SessionId>,
    total_duration_ms: u64,
    status: RoundStatus,
    score: u64,
    click_count: u64,
    rare_hit_count: u64,
    best_score: Option<u64>,
    target: Option<SpawnTarget>,
    timer: CountdownTimer,
    spawner: Box<dyn SpawnSource>,
    /// Session whose finish has been claimed; set before the request goes out
    finish_latch: Option<SessionId>,
    reconciling: bool,
    starting: bool,
}

impl RoundSession {
    pub fn new(spawner: Box<dyn SpawnSource>) -> Self {
        Self {
            session_id: None,
            total_duration_ms: 0,
            status: RoundStatus::Idle,
            score: 0,
            click_count: 0,
            rare_hit_count: 0,
            best_score: None,
            target: None,
            timer: CountdownTimer::new(),
            spawner,
            finish_latch: None,
            reconciling: false,
            starting: false,
        }
    }

    /// Reserve the right to send a start request
    ///
    /// A settled `finished` session drops back to `idle` here.
    pub fn begin_start(&mut self) -> Result<(), RoundError> {
        if self.starting {
            return Err(RoundError::StartInFlight);
        }
        if self.reconciling {
            return Err(RoundError::ReconciliationInFlight);
        }
        if self.status == RoundStatus::Running {
            return Err(RoundError::AlreadyRunning);
        }
        if self.status == RoundStatus::Finished {
            // Expired but the finish has not been claimed yet
            if self.finish_latch.is_none() {
                return Err(RoundError::ReconciliationInFlight);
            }
            self.reset();
        }
        self.starting = true;
        Ok(())
    }

    /// The start request failed; stay idle so the player can retry
    pub fn abort_start(&mut self) {
        self.starting = false;
    }

    /// `idle -> running` with the server-provided parameters
    pub fn activate(&mut self, started: StartedRound, now: Instant) -> SpawnTarget {
        self.starting = false;
        self.session_id = Some(started.session_id);
        self.total_duration_ms = started.duration_ms;
        self.score = 0;
        self.click_count = 0;
        self.rare_hit_count = 0;
        self.finish_latch = None;
        self.timer.start(started.duration_ms, now);

        let target = self.spawner.next_target();
        self.target = Some(target);
        self.status = RoundStatus::Running;
        target
    }

    /// Score the current target and spawn the next one
    ///
    /// Ignored outside `running`, so a late click racing expiry is harmless.
    pub fn catch_target(&mut self) -> Option<CatchOutcome> {
        if self.status != RoundStatus::Running {
            return None;
        }
        let caught = self.target?;

        self.score += caught.score_value as u64;
        self.click_count += 1;
        if caught.kind == BONUS_TRACKED_KIND {
            self.rare_hit_count += 1;
        }

        let next = self.spawner.next_target();
        self.target = Some(next);

        Some(CatchOutcome {
            points: caught.score_value,
            score: self.score,
            next,
        })
    }

    /// Poll the countdown; expiry is the only way out of `running`
    pub fn tick(&mut self, now: Instant) -> Option<SessionTick> {
        if self.status != RoundStatus::Running {
            return None;
        }
        match self.timer.tick(now) {
            TimerTick::Remaining(ms) => Some(SessionTick::Remaining(ms)),
            TimerTick::Expired => {
                self.status = RoundStatus::Finished;
                self.target = None;
                Some(SessionTick::Expired)
            }
            TimerTick::Inactive => None,
        }
    }

    /// One-shot latch: hands out the finish payload at most once per session
    pub fn claim_finish(&mut self) -> Option<FinishSubmission> {
        if self.status != RoundStatus::Finished {
            return None;
        }
        let session_id = self.session_id.clone()?;
        if self.finish_latch.as_ref() == Some(&session_id) {
            return None;
        }

        self.finish_latch = Some(session_id.clone());
        self.reconciling = true;

        Some(FinishSubmission {
            session_id,
            score: self.score,
            clicks: self.click_count,
            epic_count: self.rare_hit_count,
        })
    }

    /// The finish request resolved, successfully or not. The latch stays set.
    pub fn settle_finish(&mut self, accepted_score: Option<u64>) {
        self.reconciling = false;
        if let Some(score) = accepted_score {
            self.best_score = Some(self.best_score.map_or(score, |best| best.max(score)));
        }
    }

    /// Abandon whatever is in progress (owner went away)
    pub fn teardown(&mut self) {
        self.timer.cancel();
        self.starting = false;
        if self.status == RoundStatus::Running {
            self.status = RoundStatus::Idle;
            self.target = None;
        }
    }

    fn reset(&mut self) {
        self.status = RoundStatus::Idle;
        self.session_id = None;
        self.target = None;
        self.score = 0;
        self.click_count = 0;
        self.rare_hit_count = 0;
        self.timer = CountdownTimer::new();
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn click_count(&self) -> u64 {
        self.click_count
    }

    pub fn rare_hit_count(&self) -> u64 {
        self.rare_hit_count
    }

    pub fn best_score(&self) -> Option<u64> {
        self.best_score
    }

    pub fn target(&self) -> Option<&SpawnTarget> {
        self.target.as_ref()
    }

    pub fn is_reconciling(&self) -> bool {
        self.reconciling
    }

    /// Finished, claimed and no longer waiting on the backend
    pub fn is_settled(&self) -> bool {
        self.status == RoundStatus::Finished && self.finish_latch.is_some() && !self.reconciling
    }

    pub fn hud(&self) -> Hud {
        let remaining_ms = self.timer.remaining_ms();
        let progress = if self.total_duration_ms > 0 {
            (remaining_ms as f64 / self.total_duration_ms as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Hud {
            status: self.status,
            score: self.score,
            best_score: self.best_score,
            remaining_ms,
            seconds_left: (self.status == RoundStatus::Running)
                .then(|| remaining_ms.div_ceil(1000)),
            progress,
        }
    }
}
