//! Wire types for the game backend
//!
//! JSON over HTTPS, `camelCase` on the wire. Response bodies are parsed
//! leniently: an empty or unparsable body is read as `{}` and numeric fields
//! of the wrong type are treated as absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::timing::DEFAULT_ROUND_DURATION_MS;
use crate::game::reconcile::{FinishSubmission, ReconciliationResult};
use crate::game::session::SessionId;
use crate::net::backend::ApiError;
use crate::profile::Profile;

/// Parse a response body, tolerating empty or malformed payloads
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Pick the server-provided error text, falling back to `fallback`
pub fn error_message(body: &Value, fallback: &str) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn is_empty_object(body: &Value) -> bool {
    body.as_object().is_some_and(Map::is_empty)
}

// ----------------------------------------------------------------------------
// POST /game/start
// ----------------------------------------------------------------------------

/// Server-issued round parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRound {
    pub session_id: SessionId,
    pub duration_ms: u64,
}

impl StartedRound {
    pub fn from_body(body: &Value) -> Result<Self, ApiError> {
        let session_id = body
            .get("gameId")
            .and_then(SessionId::from_value)
            .ok_or_else(|| ApiError::Malformed("start response is missing gameId".to_string()))?;

        let duration_ms = body
            .get("roundDurationMs")
            .and_then(Value::as_i64)
            .filter(|ms| *ms > 0)
            .map(|ms| ms as u64)
            .unwrap_or(DEFAULT_ROUND_DURATION_MS);

        Ok(Self {
            session_id,
            duration_ms,
        })
    }
}

// ----------------------------------------------------------------------------
// POST /game/finish
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishGameRequest {
    pub game_id: SessionId,
    pub score: u64,
    pub clicks: u64,
    pub epic_count: u64,
}

impl From<&FinishSubmission> for FinishGameRequest {
    fn from(submission: &FinishSubmission) -> Self {
        Self {
            game_id: submission.session_id.clone(),
            score: submission.score,
            clicks: submission.clicks,
            epic_count: submission.epic_count,
        }
    }
}

impl ReconciliationResult {
    /// Interpret a 2xx finish response; a missing `accepted` flag means accepted
    pub fn from_body(body: &Value) -> Self {
        Self {
            accepted: body.get("accepted").and_then(Value::as_bool).unwrap_or(true),
            total_stars: body.get("totalStars").and_then(Value::as_u64),
            level: body
                .get("level")
                .and_then(Value::as_u64)
                .map(|level| level.min(u32::MAX as u64) as u32),
            xp: body.get("xp").and_then(Value::as_u64),
            referral_reward: body
                .get("referralReward")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        }
    }
}

// ----------------------------------------------------------------------------
// GET /tournament/current
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Planned,
    Active,
    Finished,
}

/// One tournament entrant, in the order the backend ranks them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: i64,
    #[serde(default, alias = "username")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub score: i64,
}

/// Hourly tournament descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentWindow {
    pub tournament_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub join_deadline: DateTime<Utc>,
    #[serde(default)]
    pub entry_fee: u64,
    #[serde(default)]
    pub prize_pool: u64,
    pub status: TournamentStatus,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl TournamentWindow {
    /// `null` or `{}` means there is no current tournament
    pub fn from_body(body: &Value) -> Result<Option<Self>, ApiError> {
        if body.is_null() || is_empty_object(body) {
            return Ok(None);
        }
        serde_json::from_value(body.clone())
            .map(Some)
            .map_err(|e| ApiError::Malformed(format!("tournament: {}", e)))
    }
}

// ----------------------------------------------------------------------------
// POST /tournament/join
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinResponse {
    pub joined: Option<bool>,
    pub reason: Option<String>,
    pub coins: Option<u64>,
}

impl JoinResponse {
    pub fn from_body(body: &Value) -> Self {
        Self {
            joined: body.get("joined").and_then(Value::as_bool),
            reason: body.get("reason").and_then(Value::as_str).map(str::to_string),
            coins: body.get("coins").and_then(Value::as_u64),
        }
    }
}

// ----------------------------------------------------------------------------
// GET /users/me
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub stars: u64,
    pub coins: u64,
    pub multiplier_level: u32,
    pub extra_time_level: u32,
    pub epic_boost_level: u32,
    pub level: u32,
    pub xp: u64,
}

impl From<ProfileResponse> for Profile {
    fn from(me: ProfileResponse) -> Self {
        Profile {
            stars: me.stars,
            coins: me.coins,
            level: me.level,
            xp: me.xp,
            display_name: me.username.or(me.first_name),
        }
    }
}

// ----------------------------------------------------------------------------
// GET /game/leaderboard
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaderboardUser {
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub user: Option<LeaderboardUser>,
}

impl LeaderboardEntry {
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.username.as_deref().or(u.first_name.as_deref()))
            .filter(|name| !name.is_empty())
            .unwrap_or("Player")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_tolerates_garbage() {
        assert_eq!(parse_body(""), json!({}));
        assert_eq!(parse_body("   "), json!({}));
        assert_eq!(parse_body("<html>502</html>"), json!({}));
        assert_eq!(parse_body("null"), Value::Null);
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(
            error_message(&json!({"message": "Game not found"}), "x"),
            "Game not found"
        );
        assert_eq!(error_message(&json!({"error": "Unauthorized"}), "x"), "Unauthorized");
        assert_eq!(
            error_message(&json!({}), "Could not finish the game"),
            "Could not finish the game"
        );
        assert_eq!(error_message(&json!({"message": ""}), "fallback"), "fallback");
    }

    #[test]
    fn test_started_round_defaults_duration() {
        let started = StartedRound::from_body(&json!({"gameId": 17})).unwrap();
        assert_eq!(started.session_id, SessionId::Numeric(17));
        assert_eq!(started.duration_ms, 60_000);

        let bonus =
            StartedRound::from_body(&json!({"gameId": "g-1", "roundDurationMs": 75000})).unwrap();
        assert_eq!(bonus.session_id, SessionId::Text("g-1".to_string()));
        assert_eq!(bonus.duration_ms, 75_000);

        let zero = StartedRound::from_body(&json!({"gameId": 1, "roundDurationMs": 0})).unwrap();
        assert_eq!(zero.duration_ms, 60_000);
    }

    #[test]
    fn test_started_round_requires_game_id() {
        let err = StartedRound::from_body(&json!({"roundDurationMs": 1000})).unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn test_finish_request_shape() {
        let request = FinishGameRequest {
            game_id: SessionId::Numeric(5),
            score: 8,
            clicks: 4,
            epic_count: 1,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"gameId": 5, "score": 8, "clicks": 4, "epicCount": 1}));
    }

    #[test]
    fn test_reconciliation_result_ignores_wrong_types() {
        let result = ReconciliationResult::from_body(&json!({
            "totalStars": 120,
            "level": "3",
            "xp": 40,
        }));
        assert!(result.accepted);
        assert_eq!(result.total_stars, Some(120));
        assert_eq!(result.level, None);
        assert_eq!(result.xp, Some(40));
        assert_eq!(result.referral_reward, 0);
    }

    #[test]
    fn test_reconciliation_result_declined() {
        let result = ReconciliationResult::from_body(&json!({"accepted": false, "totalStars": 3}));
        assert!(!result.accepted);
        assert_eq!(result.total_stars, Some(3));
    }

    #[test]
    fn test_tournament_window_parsing() {
        let body = json!({
            "tournamentId": 42,
            "startsAt": "2026-10-16T12:00:00Z",
            "endsAt": "2026-10-16T13:00:00Z",
            "joinDeadline": "2026-10-16T12:30:00Z",
            "entryFee": 10,
            "prizePool": 250,
            "status": "ACTIVE",
            "participants": [
                {"userId": 1, "username": "alice", "score": 90},
                {"userId": 2, "username": null, "score": 40}
            ]
        });

        let window = TournamentWindow::from_body(&body).unwrap().unwrap();
        assert_eq!(window.tournament_id, 42);
        assert_eq!(window.status, TournamentStatus::Active);
        assert_eq!(window.participants.len(), 2);
        assert_eq!(window.participants[0].display_name.as_deref(), Some("alice"));
        assert!(window.participants[1].display_name.is_none());
    }

    #[test]
    fn test_tournament_absent() {
        assert!(TournamentWindow::from_body(&Value::Null).unwrap().is_none());
        assert!(TournamentWindow::from_body(&json!({})).unwrap().is_none());
        assert!(TournamentWindow::from_body(&json!({"status": "ACTIVE"})).is_err());
    }

    #[test]
    fn test_join_response() {
        let already =
            JoinResponse::from_body(&json!({"joined": false, "reason": "ALREADY_JOINED"}));
        assert_eq!(already.joined, Some(false));
        assert_eq!(already.reason.as_deref(), Some("ALREADY_JOINED"));
        assert!(already.coins.is_none());

        let joined = JoinResponse::from_body(&json!({"joined": true, "coins": 90}));
        assert_eq!(joined.coins, Some(90));
    }

    #[test]
    fn test_profile_response_into_profile() {
        let me: ProfileResponse = serde_json::from_value(json!({
            "id": 7,
            "firstName": "Ann",
            "stars": 300,
            "coins": 12,
            "multiplierLevel": 1,
            "level": 5,
            "xp": 77
        }))
        .unwrap();
        let profile = Profile::from(me);
        assert_eq!(profile.stars, 300);
        assert_eq!(profile.coins, 12);
        assert_eq!(profile.level, 5);
        assert_eq!(profile.display_name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_leaderboard_display_name() {
        let entries: Vec<LeaderboardEntry> = serde_json::from_value(json!([
            {"id": 1, "score": 50, "user": {"username": "bob"}},
            {"id": 2, "score": 40, "user": {"firstName": "Eve"}},
            {"id": 3, "score": 30}
        ]))
        .unwrap();
        assert_eq!(entries[0].display_name(), "bob");
        assert_eq!(entries[1].display_name(), "Eve");
        assert_eq!(entries[2].display_name(), "Player");
    }
}
