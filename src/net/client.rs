//! reqwest implementation of [`Backend`]
//!
//! Every call sends `Content-Type: application/json`; authenticated calls add
//! the bearer token. Bodies are read as text and parsed leniently so that an
//! empty or HTML error page never turns into a crash.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::game::reconcile::{FinishSubmission, ReconciliationResult};
use crate::net::backend::{ApiError, Backend};
use crate::net::protocol::{
    error_message, parse_body, FinishGameRequest, JoinResponse, LeaderboardEntry, ProfileResponse,
    StartedRound, TournamentWindow,
};
use crate::profile::Profile;

/// HTTP client for the game backend
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Build a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the parsed body of a 2xx response
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        authenticated: bool,
        fallback: &str,
    ) -> Result<Value, ApiError> {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, "application/json");

        if authenticated {
            let token = self.token.as_deref().ok_or(ApiError::MissingCredential)?;
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!("{} {}", method, path);

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = parse_body(&text);

        if !status.is_success() {
            let message = error_message(&body, fallback);
            warn!("{} {} failed: {} - {}", method, path, status, message);
            return Err(ApiError::Application {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

impl Backend for HttpBackend {
    async fn start_game(&self) -> Result<StartedRound, ApiError> {
        let body = self
            .send(Method::POST, "/game/start", None, true, "Could not start the game")
            .await?;
        StartedRound::from_body(&body)
    }

    async fn finish_game(
        &self,
        submission: &FinishSubmission,
    ) -> Result<ReconciliationResult, ApiError> {
        let request = serde_json::to_value(FinishGameRequest::from(submission))
            .map_err(|e| ApiError::Malformed(format!("Failed to encode finish request: {}", e)))?;
        let body = self
            .send(
                Method::POST,
                "/game/finish",
                Some(request),
                true,
                "Could not finish the game",
            )
            .await?;
        Ok(ReconciliationResult::from_body(&body))
    }

    async fn current_tournament(&self) -> Result<Option<TournamentWindow>, ApiError> {
        let body = self
            .send(
                Method::GET,
                "/tournament/current",
                None,
                false,
                "Could not load the tournament",
            )
            .await?;
        TournamentWindow::from_body(&body)
    }

    async fn join_tournament(&self) -> Result<JoinResponse, ApiError> {
        let body = self
            .send(
                Method::POST,
                "/tournament/join",
                None,
                true,
                "Could not join the tournament",
            )
            .await?;
        Ok(JoinResponse::from_body(&body))
    }

    async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        let body = self
            .send(Method::GET, "/users/me", None, true, "Could not load the profile")
            .await?;
        let me: ProfileResponse = serde_json::from_value(body)
            .map_err(|e| ApiError::Malformed(format!("profile: {}", e)))?;
        Ok(me.into())
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let body = self
            .send(
                Method::GET,
                "/game/leaderboard",
                None,
                false,
                "Could not load the leaderboard",
            )
            .await?;
        serde_json::from_value(body).map_err(|e| ApiError::Malformed(format!("leaderboard: {}", e)))
    }
}
