//! Finish reconciliation
//!
//! Sends the client-observed outcome of a round and folds the backend's
//! authoritative answer into the profile. The round score stays whatever the
//! client counted; stars, level and xp always come from the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::events::{EventSink, GameEvent};
use crate::game::session::{RoundError, SessionId};
use crate::metrics::ClientMetrics;
use crate::net::backend::Backend;
use crate::profile::{ProfileDelta, ProfileSink};

/// What the client observed during a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishSubmission {
    pub session_id: SessionId,
    pub score: u64,
    pub clicks: u64,
    pub epic_count: u64,
}

/// The backend's verdict on a round. Absent fields were missing or not numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub accepted: bool,
    pub total_stars: Option<u64>,
    pub level: Option<u32>,
    pub xp: Option<u64>,
    pub referral_reward: u64,
}

impl ReconciliationResult {
    /// Profile fields this result overwrites. Level and xp travel together.
    pub fn profile_delta(&self) -> ProfileDelta {
        let (level, xp) = match (self.level, self.xp) {
            (Some(level), Some(xp)) => (Some(level), Some(xp)),
            _ => (None, None),
        };
        ProfileDelta {
            stars: self.total_stars,
            coins: None,
            level,
            xp,
        }
    }
}

/// Sends finish requests and applies their results
pub struct Reconciler<B> {
    backend: Arc<B>,
    profile: Arc<dyn ProfileSink>,
    events: EventSink,
    metrics: Arc<ClientMetrics>,
    alive: Arc<AtomicBool>,
}

impl<B: Backend> Reconciler<B> {
    pub fn new(
        backend: Arc<B>,
        profile: Arc<dyn ProfileSink>,
        events: EventSink,
        metrics: Arc<ClientMetrics>,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            backend,
            profile,
            events,
            metrics,
            alive,
        }
    }

    /// Send one submission; never retries
    ///
    /// A lost response after the server persisted the round would make a retry
    /// credit twice, so failures are surfaced and the round is left as is.
    pub async fn submit(
        &self,
        submission: &FinishSubmission,
    ) -> Result<ReconciliationResult, RoundError> {
        ClientMetrics::incr(&self.metrics.finish_submissions);
        info!(
            "Submitting round {}: score={} clicks={} epic={}",
            submission.session_id, submission.score, submission.clicks, submission.epic_count
        );

        let response = self.backend.finish_game(submission).await;

        if !self.alive.load(Ordering::Acquire) {
            warn!("Round {} resolved after shutdown, result dropped", submission.session_id);
            return Err(RoundError::ShutDown);
        }

        match response {
            Ok(result) => {
                self.apply(&result);
                Ok(result)
            }
            Err(e) => {
                ClientMetrics::incr(&self.metrics.finish_failures);
                warn!("Finish for round {} failed: {}", submission.session_id, e);
                self.events.error(e.to_string());
                Err(e.into())
            }
        }
    }

    fn apply(&self, result: &ReconciliationResult) {
        if !result.accepted {
            warn!("Backend declined the round, profile left as is");
            self.events.error("The round was not accepted");
            return;
        }

        let delta = result.profile_delta();
        self.profile.apply_delta(&delta);

        if result.referral_reward > 0 {
            ClientMetrics::incr(&self.metrics.referral_rewards);
            info!("Referral reward: +{} stars", result.referral_reward);
            self.events.emit(GameEvent::ReferralReward {
                stars: result.referral_reward,
            });
        }

        self.events.emit(GameEvent::Reconciled(result.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::backend::ApiError;
    use crate::net::testing::ScriptedBackend;
    use crate::profile::{Profile, SharedProfile};

    fn submission() -> FinishSubmission {
        FinishSubmission {
            session_id: SessionId::Numeric(11),
            score: 8,
            clicks: 4,
            epic_count: 1,
        }
    }

    fn reconciler(
        backend: Arc<ScriptedBackend>,
        profile: SharedProfile,
    ) -> (
        Reconciler<ScriptedBackend>,
        tokio::sync::mpsc::UnboundedReceiver<GameEvent>,
        Arc<AtomicBool>,
    ) {
        let (events, rx) = EventSink::channel();
        let alive = Arc::new(AtomicBool::new(true));
        let reconciler = Reconciler::new(
            backend,
            Arc::new(profile),
            events,
            Arc::new(ClientMetrics::new()),
            alive.clone(),
        );
        (reconciler, rx, alive)
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_delta_requires_level_and_xp_together() {
        let partial = ReconciliationResult {
            accepted: true,
            total_stars: Some(10),
            level: Some(2),
            xp: None,
            referral_reward: 0,
        };
        let delta = partial.profile_delta();
        assert_eq!(delta.stars, Some(10));
        assert_eq!(delta.level, None);
        assert_eq!(delta.xp, None);
        assert_eq!(delta.coins, None);
    }

    #[tokio::test]
    async fn test_success_overwrites_profile() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_finish(Ok(ReconciliationResult {
            accepted: true,
            total_stars: Some(500),
            level: Some(3),
            xp: Some(20),
            referral_reward: 0,
        }));
        let profile = SharedProfile::new(Profile {
            stars: 480,
            coins: 9,
            level: 2,
            xp: 90,
            display_name: None,
        });
        let (reconciler, mut rx, _alive) = reconciler(backend.clone(), profile.clone());

        let result = reconciler.submit(&submission()).await.unwrap();
        assert_eq!(result.total_stars, Some(500));

        let snapshot = profile.snapshot();
        assert_eq!(snapshot.stars, 500);
        assert_eq!(snapshot.level, 3);
        assert_eq!(snapshot.xp, 20);
        assert_eq!(snapshot.coins, 9);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], GameEvent::Reconciled(_)));
        assert_eq!(backend.submissions.lock()[0], submission());
    }

    #[tokio::test]
    async fn test_referral_reward_notifies_once() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_finish(Ok(ReconciliationResult {
            accepted: true,
            total_stars: Some(60),
            level: None,
            xp: None,
            referral_reward: 50,
        }));
        let (reconciler, mut rx, _alive) = reconciler(backend, SharedProfile::default());

        reconciler.submit(&submission()).await.unwrap();

        let rewards: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ReferralReward { .. }))
            .collect();
        assert_eq!(rewards, vec![GameEvent::ReferralReward { stars: 50 }]);
    }

    #[tokio::test]
    async fn test_rejection_leaves_profile_untouched() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_finish(Err(ApiError::Application {
            status: 400,
            message: "Game already finished".to_string(),
        }));
        let profile = SharedProfile::new(Profile {
            stars: 77,
            ..Profile::default()
        });
        let (reconciler, mut rx, _alive) = reconciler(backend, profile.clone());

        let err = reconciler.submit(&submission()).await.unwrap_err();
        assert!(matches!(err, RoundError::Api(ApiError::Application { status: 400, .. })));
        assert_eq!(profile.snapshot().stars, 77);
        assert_eq!(
            drain(&mut rx),
            vec![GameEvent::Error {
                message: "Game already finished".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_declined_round_credits_nothing() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_finish(Ok(ReconciliationResult {
            accepted: false,
            total_stars: Some(9_999),
            level: Some(9),
            xp: Some(1),
            referral_reward: 50,
        }));
        let profile = SharedProfile::new(Profile {
            stars: 12,
            ..Profile::default()
        });
        let (reconciler, mut rx, _alive) = reconciler(backend, profile.clone());

        let result = tokio_test::assert_ok!(reconciler.submit(&submission()).await);
        assert!(!result.accepted);
        assert_eq!(profile.snapshot().stars, 12);
        assert_eq!(
            drain(&mut rx),
            vec![GameEvent::Error {
                message: "The round was not accepted".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_result_after_shutdown_is_dropped() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_finish(Ok(ReconciliationResult {
            accepted: true,
            total_stars: Some(1_000),
            level: None,
            xp: None,
            referral_reward: 0,
        }));
        let profile = SharedProfile::default();
        let (reconciler, mut rx, alive) = reconciler(backend, profile.clone());

        alive.store(false, Ordering::Release);
        let err = reconciler.submit(&submission()).await.unwrap_err();
        assert_eq!(err, RoundError::ShutDown);
        assert_eq!(profile.snapshot().stars, 0);
        assert!(drain(&mut rx).is_empty());
    }
}
