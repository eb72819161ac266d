//! Tournament window evaluation
//!
//! Eligibility is a pure function of the last-known window and wall-clock
//! time, recomputed on every refresh rather than cached.

use chrono::{DateTime, Utc};

pub use crate::net::protocol::{Participant, TournamentStatus, TournamentWindow};

/// Whether the player may join right now, and what to tell them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinEligibility {
    NoTournament,
    Finished,
    JoinClosed,
    Joinable { minutes_left: i64 },
}

impl JoinEligibility {
    pub fn can_join(&self) -> bool {
        matches!(self, JoinEligibility::Joinable { .. })
    }

    pub fn message(&self) -> String {
        match self {
            JoinEligibility::NoTournament => "No active tournament right now".to_string(),
            JoinEligibility::Finished => "Tournament finished".to_string(),
            JoinEligibility::JoinClosed => "Join window closed".to_string(),
            JoinEligibility::Joinable { minutes_left } => {
                format!("You can still join, about {} min left", minutes_left)
            }
        }
    }
}

impl TournamentWindow {
    /// `starts_at <= join_deadline <= ends_at`
    pub fn is_consistent(&self) -> bool {
        self.starts_at <= self.join_deadline && self.join_deadline <= self.ends_at
    }

    pub fn status_label(&self) -> &'static str {
        match self.status {
            TournamentStatus::Planned => "starting soon",
            TournamentStatus::Active => "in progress",
            TournamentStatus::Finished => "finished",
        }
    }
}

/// Derive join eligibility at `now`
///
/// A `FINISHED` status wins even if the clock says otherwise, and a passed
/// `ends_at` wins even if the status is stale.
pub fn evaluate(window: Option<&TournamentWindow>, now: DateTime<Utc>) -> JoinEligibility {
    let Some(window) = window else {
        return JoinEligibility::NoTournament;
    };

    if window.status == TournamentStatus::Finished || now > window.ends_at {
        return JoinEligibility::Finished;
    }
    if now > window.join_deadline {
        return JoinEligibility::JoinClosed;
    }

    let left_ms = (window.join_deadline - now).num_milliseconds();
    let minutes_left = (left_ms + 59_999).div_euclid(60_000).max(0);
    JoinEligibility::Joinable { minutes_left }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 10, 0).unwrap()
    }

    fn window(status: TournamentStatus, deadline_ms: i64, ends_ms: i64) -> TournamentWindow {
        TournamentWindow {
            tournament_id: 1,
            starts_at: now() - Duration::minutes(10),
            ends_at: now() + Duration::milliseconds(ends_ms),
            join_deadline: now() + Duration::milliseconds(deadline_ms),
            entry_fee: 10,
            prize_pool: 500,
            status,
            participants: Vec::new(),
        }
    }

    #[test]
    fn test_no_window() {
        let eligibility = evaluate(None, now());
        assert_eq!(eligibility, JoinEligibility::NoTournament);
        assert!(!eligibility.can_join());
    }

    #[test]
    fn test_joinable_minutes_left() {
        let w = window(TournamentStatus::Active, 300_000, 1_800_000);
        assert_eq!(evaluate(Some(&w), now()), JoinEligibility::Joinable { minutes_left: 5 });
    }

    #[test]
    fn test_minutes_round_up() {
        let w = window(TournamentStatus::Active, 240_001, 1_800_000);
        assert_eq!(evaluate(Some(&w), now()), JoinEligibility::Joinable { minutes_left: 5 });

        let w = window(TournamentStatus::Planned, 1, 1_800_000);
        assert_eq!(evaluate(Some(&w), now()), JoinEligibility::Joinable { minutes_left: 1 });
    }

    #[test]
    fn test_deadline_instant_is_still_joinable() {
        let w = window(TournamentStatus::Active, 0, 1_800_000);
        assert_eq!(evaluate(Some(&w), now()), JoinEligibility::Joinable { minutes_left: 0 });
    }

    #[test]
    fn test_past_deadline_is_closed() {
        let w = window(TournamentStatus::Active, -1, 1_800_000);
        assert_eq!(evaluate(Some(&w), now()), JoinEligibility::JoinClosed);
    }

    #[test]
    fn test_stale_active_status_after_end_is_finished() {
        let w = TournamentWindow {
            starts_at: now() - Duration::hours(2),
            ..window(TournamentStatus::Active, -3_600_000, -60_000)
        };
        assert_eq!(evaluate(Some(&w), now()), JoinEligibility::Finished);
    }

    #[test]
    fn test_finished_status_wins_over_clock() {
        let w = window(TournamentStatus::Finished, 300_000, 1_800_000);
        assert_eq!(evaluate(Some(&w), now()), JoinEligibility::Finished);
    }

    #[test]
    fn test_consistency_check() {
        assert!(window(TournamentStatus::Active, 300_000, 1_800_000).is_consistent());
        assert!(!window(TournamentStatus::Active, 1_900_000, 1_800_000).is_consistent());

        let mut w = window(TournamentStatus::Planned, 300_000, 1_800_000);
        w.starts_at = now() + Duration::minutes(6);
        assert!(!w.is_consistent());
    }

    #[test]
    fn test_labels_and_messages() {
        assert_eq!(window(TournamentStatus::Planned, 0, 1).status_label(), "starting soon");
        assert_eq!(window(TournamentStatus::Active, 0, 1).status_label(), "in progress");
        assert_eq!(window(TournamentStatus::Finished, 0, 1).status_label(), "finished");
        assert_eq!(
            JoinEligibility::Joinable { minutes_left: 5 }.message(),
            "You can still join, about 5 min left"
        );
    }
}
