//! Scripted backend for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::game::reconcile::{FinishSubmission, ReconciliationResult};
use crate::net::backend::{ApiError, Backend};
use crate::net::protocol::{JoinResponse, LeaderboardEntry, StartedRound, TournamentWindow};
use crate::profile::Profile;

type Script<T> = Mutex<VecDeque<Result<T, ApiError>>>;

/// Replays queued responses in order; an empty queue answers with a transport error
#[derive(Default)]
pub struct ScriptedBackend {
    starts: Script<StartedRound>,
    finishes: Script<ReconciliationResult>,
    tournaments: Script<Option<TournamentWindow>>,
    joins: Script<JoinResponse>,
    profiles: Script<Profile>,
    finish_delay: Mutex<Duration>,
    join_delay: Mutex<Duration>,
    pub start_calls: AtomicUsize,
    pub finish_calls: AtomicUsize,
    pub tournament_calls: AtomicUsize,
    pub join_calls: AtomicUsize,
    pub submissions: Mutex<Vec<FinishSubmission>>,
}

fn next<T>(script: &Script<T>) -> Result<T, ApiError> {
    script
        .lock()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Transport("no scripted response".to_string())))
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_start(&self, response: Result<StartedRound, ApiError>) {
        self.starts.lock().push_back(response);
    }

    pub fn push_finish(&self, response: Result<ReconciliationResult, ApiError>) {
        self.finishes.lock().push_back(response);
    }

    pub fn push_tournament(&self, response: Result<Option<TournamentWindow>, ApiError>) {
        self.tournaments.lock().push_back(response);
    }

    pub fn push_join(&self, response: Result<JoinResponse, ApiError>) {
        self.joins.lock().push_back(response);
    }

    pub fn push_profile(&self, response: Result<Profile, ApiError>) {
        self.profiles.lock().push_back(response);
    }

    /// Simulated network latency for `finish_game`
    pub fn set_finish_delay(&self, delay: Duration) {
        *self.finish_delay.lock() = delay;
    }

    /// Simulated network latency for `join_tournament`
    pub fn set_join_delay(&self, delay: Duration) {
        *self.join_delay.lock() = delay;
    }

    pub fn finish_count(&self) -> usize {
        self.finish_calls.load(Ordering::SeqCst)
    }
}

impl Backend for ScriptedBackend {
    async fn start_game(&self) -> Result<StartedRound, ApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.starts)
    }

    async fn finish_game(
        &self,
        submission: &FinishSubmission,
    ) -> Result<ReconciliationResult, ApiError> {
        self.finish_calls.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().push(submission.clone());
        let delay = *self.finish_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        next(&self.finishes)
    }

    async fn current_tournament(&self) -> Result<Option<TournamentWindow>, ApiError> {
        self.tournament_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.tournaments)
    }

    async fn join_tournament(&self) -> Result<JoinResponse, ApiError> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.join_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        next(&self.joins)
    }

    async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        next(&self.profiles)
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        Ok(Vec::new())
    }
}
