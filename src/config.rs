use std::time::Duration;

use crate::constants::{backend, polling, timing};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the game backend (no trailing slash)
    pub api_base_url: String,
    /// Opaque bearer credential issued by the platform
    pub auth_token: Option<String>,
    /// Countdown polling cadence
    pub tick_interval: Duration,
    /// How often the current tournament is re-fetched
    pub tournament_poll_interval: Duration,
    /// How often the profile is re-fetched
    pub profile_poll_interval: Duration,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Join the current tournament automatically when it is joinable
    pub auto_join_tournament: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: backend::DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            tick_interval: Duration::from_millis(timing::TICK_INTERVAL_MS),
            tournament_poll_interval: Duration::from_secs(polling::TOURNAMENT_SECS),
            profile_poll_interval: Duration::from_secs(polling::PROFILE_SECS),
            request_timeout: Duration::from_secs(backend::REQUEST_TIMEOUT_SECS),
            auto_join_tournament: false,
        }
    }
}

impl ClientConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("API_BASE_URL") {
            let trimmed = url.trim().trim_end_matches('/');
            if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                config.api_base_url = trimmed.to_string();
            } else {
                tracing::warn!("Invalid API_BASE_URL '{}', using default", url);
            }
        } else {
            tracing::warn!("API_BASE_URL is not set, using {}", config.api_base_url);
        }

        if let Ok(token) = std::env::var("AUTH_TOKEN") {
            if !token.trim().is_empty() {
                config.auth_token = Some(token.trim().to_string());
            }
        }

        if let Ok(ms) = std::env::var("TICK_INTERVAL_MS") {
            match ms.parse::<u64>() {
                Ok(parsed) if (10..=1000).contains(&parsed) => {
                    config.tick_interval = Duration::from_millis(parsed);
                }
                Ok(_) => tracing::warn!("TICK_INTERVAL_MS must be 10-1000, using default"),
                Err(_) => tracing::warn!("Invalid TICK_INTERVAL_MS '{}', using default", ms),
            }
        }

        if let Ok(secs) = std::env::var("TOURNAMENT_POLL_SECS") {
            if let Some(parsed) = parse_positive_secs(&secs) {
                config.tournament_poll_interval = parsed;
            } else {
                tracing::warn!("Invalid TOURNAMENT_POLL_SECS '{}', using default", secs);
            }
        }

        if let Ok(secs) = std::env::var("PROFILE_POLL_SECS") {
            if let Some(parsed) = parse_positive_secs(&secs) {
                config.profile_poll_interval = parsed;
            } else {
                tracing::warn!("Invalid PROFILE_POLL_SECS '{}', using default", secs);
            }
        }

        if let Ok(secs) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Some(parsed) = parse_positive_secs(&secs) {
                config.request_timeout = parsed;
            } else {
                tracing::warn!("Invalid REQUEST_TIMEOUT_SECS '{}', using default", secs);
            }
        }

        if let Ok(flag) = std::env::var("AUTO_JOIN_TOURNAMENT") {
            config.auto_join_tournament = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.is_empty() {
            return Err("api_base_url cannot be empty".to_string());
        }
        if self.tick_interval.is_zero() {
            return Err("tick_interval must be non-zero".to_string());
        }
        if self.tournament_poll_interval < self.tick_interval {
            return Err("tournament_poll_interval cannot be shorter than tick_interval".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be non-zero".to_string());
        }
        Ok(())
    }
}

fn parse_positive_secs(raw: &str) -> Option<Duration> {
    raw.parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0 && *secs <= 3600)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.tournament_poll_interval, Duration::from_secs(15));
        assert_eq!(config.profile_poll_interval, Duration::from_secs(10));
        assert!(config.auth_token.is_none());
        assert!(!config.auto_join_tournament);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = ClientConfig::load_or_default();
        assert!(!config.tick_interval.is_zero());
        assert!(!config.api_base_url.ends_with('/'));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClientConfig {
            request_timeout: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_positive_secs() {
        assert_eq!(parse_positive_secs("15"), Some(Duration::from_secs(15)));
        assert_eq!(parse_positive_secs("0"), None);
        assert_eq!(parse_positive_secs("abc"), None);
        assert_eq!(parse_positive_secs("99999"), None);
    }
}
