//! Events the core emits towards the presentation layer

use tokio::sync::mpsc;
use tracing::debug;

use crate::game::reconcile::ReconciliationResult;
use crate::game::session::{RoundStatus, SessionId};
use crate::game::spawn::SpawnTarget;

#[cfg(feature = "tournament")]
use crate::tournament::{JoinEligibility, JoinOutcome};

/// Something the view layer may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The backend issued a session and the countdown is armed
    RoundStarted { session_id: SessionId, duration_ms: u64 },
    /// A new target is on screen
    TargetSpawned(SpawnTarget),
    /// Countdown progress
    Tick { remaining_ms: u64 },
    /// A catch landed
    Caught { points: u32, score: u64 },
    /// Round status changed
    StatusChanged(RoundStatus),
    /// The backend accepted the round and its rewards were applied
    Reconciled(ReconciliationResult),
    /// One-time celebration for a referral bonus
    ReferralReward { stars: u64 },
    /// User-visible failure message
    Error { message: String },
    /// Fresh eligibility after a tournament refresh
    #[cfg(feature = "tournament")]
    TournamentUpdated(JoinEligibility),
    /// Join request resolved
    #[cfg(feature = "tournament")]
    JoinResolved(JoinOutcome),
}

/// Fire-and-forget sender; a dropped receiver is not an error
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl EventSink {
    /// Create a sink and the receiving end for the view layer
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(GameEvent::Error {
            message: message.into(),
        });
    }
}
