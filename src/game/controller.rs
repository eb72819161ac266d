//! Round controller - drives one player's rounds against the backend
//!
//! Catches are synchronous local mutations. The countdown runs as a tokio task
//! on a fixed cadence and, on expiry, triggers finish reconciliation once.
//! Session state sits behind a `parking_lot` mutex that is never held across
//! an `.await`; every await is followed by a liveness check so nothing is
//! applied after [`RoundController::shutdown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::events::{EventSink, GameEvent};
use crate::game::reconcile::{Reconciler, ReconciliationResult};
use crate::game::session::{
    CatchOutcome, Hud, RoundError, RoundSession, RoundStatus, SessionId, SessionTick,
};
use crate::game::spawn::{Catalog, SpawnGenerator, SpawnSource, SpawnTarget};
use crate::metrics::ClientMetrics;
use crate::net::backend::Backend;
use crate::profile::ProfileSink;

/// A round the backend accepted
#[derive(Debug, Clone, PartialEq)]
pub struct RoundStarted {
    pub session_id: SessionId,
    pub duration_ms: u64,
    pub target: SpawnTarget,
}

/// How a finish call resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    Reconciled(ReconciliationResult),
    /// Nothing to send: not finished, or this session was already claimed
    Suppressed,
}

pub struct RoundController<B: Backend> {
    backend: Arc<B>,
    session: Arc<Mutex<RoundSession>>,
    reconciler: Arc<Reconciler<B>>,
    events: EventSink,
    metrics: Arc<ClientMetrics>,
    alive: Arc<AtomicBool>,
    tick_interval: Duration,
    countdown: Mutex<Option<JoinHandle<()>>>,
}

impl<B: Backend> RoundController<B> {
    /// Controller spawning from the default catalog
    pub fn new(
        backend: Arc<B>,
        profile: Arc<dyn ProfileSink>,
        events: EventSink,
        metrics: Arc<ClientMetrics>,
        config: &ClientConfig,
    ) -> Self {
        let spawner = SpawnGenerator::new(Catalog::default());
        Self::with_spawner(backend, profile, events, metrics, config, Box::new(spawner))
    }

    pub fn with_spawner(
        backend: Arc<B>,
        profile: Arc<dyn ProfileSink>,
        events: EventSink,
        metrics: Arc<ClientMetrics>,
        config: &ClientConfig,
        spawner: Box<dyn SpawnSource>,
    ) -> Self {
        let alive = Arc::new(AtomicBool::new(true));
        let reconciler = Arc::new(Reconciler::new(
            backend.clone(),
            profile,
            events.clone(),
            metrics.clone(),
            alive.clone(),
        ));

        Self {
            backend,
            session: Arc::new(Mutex::new(RoundSession::new(spawner))),
            reconciler,
            events,
            metrics,
            alive,
            tick_interval: config.tick_interval,
            countdown: Mutex::new(None),
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Ask the backend for a new round and arm the countdown
    pub async fn start_round(&self) -> Result<RoundStarted, RoundError> {
        if !self.is_alive() {
            return Err(RoundError::ShutDown);
        }
        self.session.lock().begin_start()?;

        let response = self.backend.start_game().await;

        if !self.is_alive() {
            self.session.lock().abort_start();
            return Err(RoundError::ShutDown);
        }

        let started = match response {
            Ok(started) => started,
            Err(e) => {
                self.session.lock().abort_start();
                ClientMetrics::incr(&self.metrics.start_failures);
                warn!("Start request failed: {}", e);
                self.events.error(e.to_string());
                return Err(e.into());
            }
        };

        let session_id = started.session_id.clone();
        let duration_ms = started.duration_ms;
        let target = self.session.lock().activate(started, Instant::now());

        ClientMetrics::incr(&self.metrics.rounds_started);
        info!("Round {} started ({} ms)", session_id, duration_ms);

        self.events.emit(GameEvent::RoundStarted {
            session_id: session_id.clone(),
            duration_ms,
        });
        self.events.emit(GameEvent::StatusChanged(RoundStatus::Running));
        self.events.emit(GameEvent::TargetSpawned(target));

        self.spawn_countdown();

        Ok(RoundStarted {
            session_id,
            duration_ms,
            target,
        })
    }

    /// Player hit the current target; a no-op unless a round is running
    pub fn catch_monster(&self) -> Option<CatchOutcome> {
        let outcome = self.session.lock().catch_target()?;

        ClientMetrics::incr(&self.metrics.catches_total);
        debug!("Caught +{} (score {})", outcome.points, outcome.score);
        self.events.emit(GameEvent::Caught {
            points: outcome.points,
            score: outcome.score,
        });
        self.events.emit(GameEvent::TargetSpawned(outcome.next));
        Some(outcome)
    }

    /// Submit the finished round; later calls for the same session are no-ops
    pub async fn finish_round(&self) -> Result<FinishOutcome, RoundError> {
        run_finish(&self.session, &self.reconciler, &self.metrics).await
    }

    fn spawn_countdown(&self) {
        let session = self.session.clone();
        let reconciler = self.reconciler.clone();
        let events = self.events.clone();
        let metrics = self.metrics.clone();
        let alive = self.alive.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !alive.load(Ordering::Acquire) {
                    break;
                }

                let tick = session.lock().tick(Instant::now());
                match tick {
                    Some(SessionTick::Remaining(remaining_ms)) => {
                        events.emit(GameEvent::Tick { remaining_ms });
                    }
                    Some(SessionTick::Expired) => {
                        ClientMetrics::incr(&metrics.rounds_finished);
                        events.emit(GameEvent::Tick { remaining_ms: 0 });
                        events.emit(GameEvent::StatusChanged(RoundStatus::Finished));

                        if let Err(e) = run_finish(&session, &reconciler, &metrics).await {
                            debug!("Finish after expiry did not complete: {}", e);
                        }
                        break;
                    }
                    // Round was torn down underneath us
                    None => break,
                }
            }
        });

        if let Some(previous) = self.countdown.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn status(&self) -> RoundStatus {
        self.session.lock().status()
    }

    pub fn hud(&self) -> Hud {
        self.session.lock().hud()
    }

    /// The last round finished and its reconciliation is no longer pending
    pub fn round_settled(&self) -> bool {
        self.session.lock().is_settled()
    }

    /// Stop the countdown and drop any result still in flight
    pub fn shutdown(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.countdown.lock().take() {
            handle.abort();
        }
        self.session.lock().teardown();
        info!("Round controller shut down");
    }
}

impl<B: Backend> Drop for RoundController<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_finish<B: Backend>(
    session: &Mutex<RoundSession>,
    reconciler: &Reconciler<B>,
    metrics: &ClientMetrics,
) -> Result<FinishOutcome, RoundError> {
    let claimed = session.lock().claim_finish();
    let Some(submission) = claimed else {
        ClientMetrics::incr(&metrics.duplicate_finish_suppressed);
        debug!("Finish suppressed: nothing to submit");
        return Ok(FinishOutcome::Suppressed);
    };

    let result = reconciler.submit(&submission).await;

    let accepted_score = result
        .as_ref()
        .ok()
        .filter(|r| r.accepted)
        .map(|_| submission.score);
    session.lock().settle_finish(accepted_score);

    result.map(FinishOutcome::Reconciled)
}
