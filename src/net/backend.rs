//! The backend contract the core depends on

use std::future::Future;

use crate::game::reconcile::{FinishSubmission, ReconciliationResult};
use crate::net::protocol::{JoinResponse, LeaderboardEntry, StartedRound, TournamentWindow};
use crate::profile::Profile;

/// Failures talking to the backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("Network error: {0}")]
    Transport(String),
    /// Non-2xx status with the server's message
    #[error("{message}")]
    Application { status: u16, message: String },
    /// 2xx response missing data the operation needs
    #[error("Unexpected response: {0}")]
    Malformed(String),
    /// An authenticated call was attempted without a bearer token
    #[error("Not authenticated")]
    MissingCredential,
}

/// Authoritative game backend
///
/// Every method is non-blocking; results are delivered when the returned
/// future resolves.
pub trait Backend: Send + Sync + 'static {
    /// `POST /game/start`
    fn start_game(&self) -> impl Future<Output = Result<StartedRound, ApiError>> + Send;

    /// `POST /game/finish`
    fn finish_game(
        &self,
        submission: &FinishSubmission,
    ) -> impl Future<Output = Result<ReconciliationResult, ApiError>> + Send;

    /// `GET /tournament/current`
    fn current_tournament(
        &self,
    ) -> impl Future<Output = Result<Option<TournamentWindow>, ApiError>> + Send;

    /// `POST /tournament/join`
    fn join_tournament(&self) -> impl Future<Output = Result<JoinResponse, ApiError>> + Send;

    /// `GET /users/me`
    fn fetch_profile(&self) -> impl Future<Output = Result<Profile, ApiError>> + Send;

    /// `GET /game/leaderboard`
    fn leaderboard(&self) -> impl Future<Output = Result<Vec<LeaderboardEntry>, ApiError>> + Send;
}
