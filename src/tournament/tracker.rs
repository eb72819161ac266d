//! Tournament tracker - keeps the current window fresh and runs joins
//!
//! Polling and joining share one window slot. A background refresh may
//! overwrite it at any time; the join path never reads the slot after its own
//! request, so a racing refresh cannot change how a join resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::constants::backend::ALREADY_JOINED;
use crate::events::{EventSink, GameEvent};
use crate::metrics::ClientMetrics;
use crate::net::backend::{ApiError, Backend};
use crate::profile::{ProfileDelta, ProfileSink};
use crate::tournament::window::{evaluate, JoinEligibility, TournamentWindow};

/// How the backend answered a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    /// Benign: the player was already a participant
    AlreadyJoined,
    /// 2xx with a shape that is neither of the above
    Unexpected,
}

impl JoinOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            JoinOutcome::Joined => "Joined the tournament. Good luck!",
            JoinOutcome::AlreadyJoined => "You are already in this tournament",
            JoinOutcome::Unexpected => "Request completed, but the server response was unclear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("A join request is already in flight")]
    InFlight,
    #[error("No tournament to join")]
    NoTournament,
    #[error("Tournament tracker has been shut down")]
    ShutDown,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Releases the join slot however the join future ends
struct JoinSlot<'a>(&'a AtomicBool);

impl Drop for JoinSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TournamentTracker<B: Backend> {
    backend: Arc<B>,
    window: RwLock<Option<TournamentWindow>>,
    profile: Arc<dyn ProfileSink>,
    events: EventSink,
    metrics: Arc<ClientMetrics>,
    alive: AtomicBool,
    joining: AtomicBool,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<B: Backend> TournamentTracker<B> {
    pub fn new(
        backend: Arc<B>,
        profile: Arc<dyn ProfileSink>,
        events: EventSink,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            backend,
            window: RwLock::new(None),
            profile,
            events,
            metrics,
            alive: AtomicBool::new(true),
            joining: AtomicBool::new(false),
            poll_task: Mutex::new(None),
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Last-known window
    pub fn window(&self) -> Option<TournamentWindow> {
        self.window.read().clone()
    }

    /// Eligibility of the last-known window at the current instant
    pub fn eligibility(&self) -> JoinEligibility {
        evaluate(self.window.read().as_ref(), Utc::now())
    }

    pub fn is_joining(&self) -> bool {
        self.joining.load(Ordering::Acquire)
    }

    /// Fetch the current window
    ///
    /// Failures and inconsistent windows leave the last-known window in place.
    pub async fn refresh(&self) -> Result<JoinEligibility, ApiError> {
        let fetched = self.backend.current_tournament().await;

        if !self.is_alive() {
            return Ok(self.eligibility());
        }

        let window = match fetched {
            Ok(window) => window,
            Err(e) => {
                ClientMetrics::incr(&self.metrics.tournament_refresh_failures);
                debug!("Tournament refresh failed: {}", e);
                return Err(e);
            }
        };

        if let Some(w) = &window {
            if !w.is_consistent() {
                ClientMetrics::incr(&self.metrics.tournament_refresh_failures);
                warn!(
                    "Tournament {} has an inconsistent window, keeping last known",
                    w.tournament_id
                );
                return Err(ApiError::Malformed(format!(
                    "tournament {} window out of order",
                    w.tournament_id
                )));
            }
        }

        *self.window.write() = window;
        ClientMetrics::incr(&self.metrics.tournament_refreshes);

        let eligibility = self.eligibility();
        self.events.emit(GameEvent::TournamentUpdated(eligibility.clone()));
        Ok(eligibility)
    }

    /// Refresh on a fixed cadence until shutdown or until the tracker is dropped
    pub fn start_polling(self: &Arc<Self>, interval: Duration) {
        let tracker: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(tracker) = tracker.upgrade() else {
                    break;
                };
                if !tracker.is_alive() {
                    break;
                }
                // Failures already counted and logged
                let _ = tracker.refresh().await;
            }
        });

        if let Some(previous) = self.poll_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Ask to join the current tournament; one request at a time
    pub async fn join(&self) -> Result<JoinOutcome, JoinError> {
        if !self.is_alive() {
            return Err(JoinError::ShutDown);
        }
        if self.window.read().is_none() {
            return Err(JoinError::NoTournament);
        }
        if self
            .joining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JoinError::InFlight);
        }
        let _slot = JoinSlot(&self.joining);

        let response = self.backend.join_tournament().await;

        if !self.is_alive() {
            return Err(JoinError::ShutDown);
        }

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Join failed: {}", e);
                self.events.error(e.to_string());
                return Err(e.into());
            }
        };

        let outcome = match (response.joined, response.reason.as_deref()) {
            (Some(true), _) => JoinOutcome::Joined,
            (Some(false), Some(reason)) if reason == ALREADY_JOINED => JoinOutcome::AlreadyJoined,
            _ => JoinOutcome::Unexpected,
        };

        if outcome != JoinOutcome::Unexpected {
            if let Some(coins) = response.coins {
                self.profile.apply_delta(&ProfileDelta::coins(coins));
            }
            ClientMetrics::incr(&self.metrics.tournament_joins);
            info!("Tournament join resolved: {:?}", outcome);

            // Participant standings only; failure is not worth surfacing
            if let Err(e) = self.refresh().await {
                debug!("Post-join refresh failed: {}", e);
            }
        } else {
            warn!("Unexpected join response: {:?}", response);
        }

        if !self.is_alive() {
            return Err(JoinError::ShutDown);
        }
        self.events.emit(GameEvent::JoinResolved(outcome.clone()));
        Ok(outcome)
    }

    /// Stop polling and ignore anything still in flight
    pub fn shutdown(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.poll_task.lock().take() {
            handle.abort();
        }
        info!("Tournament tracker shut down");
    }
}

impl<B: Backend> Drop for TournamentTracker<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
