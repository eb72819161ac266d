//! Prometheus-compatible client counters
//!
//! Counters are bumped by the round controller and the tournament tracker.
//! The binary renders them on exit; nothing here performs I/O.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Metrics registry for one client process
#[derive(Debug)]
pub struct ClientMetrics {
    // Round lifecycle
    pub rounds_started: AtomicU64,
    pub start_failures: AtomicU64,
    pub catches_total: AtomicU64,
    pub rounds_finished: AtomicU64,

    // Reconciliation
    pub finish_submissions: AtomicU64,
    pub finish_failures: AtomicU64,
    pub duplicate_finish_suppressed: AtomicU64,
    pub referral_rewards: AtomicU64,

    // Tournament
    pub tournament_refreshes: AtomicU64,
    pub tournament_refresh_failures: AtomicU64,
    pub tournament_joins: AtomicU64,

    // Profile
    pub profile_refreshes: AtomicU64,

    start_time: Instant,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            rounds_started: AtomicU64::new(0),
            start_failures: AtomicU64::new(0),
            catches_total: AtomicU64::new(0),
            rounds_finished: AtomicU64::new(0),
            finish_submissions: AtomicU64::new(0),
            finish_failures: AtomicU64::new(0),
            duplicate_finish_suppressed: AtomicU64::new(0),
            referral_rewards: AtomicU64::new(0),
            tournament_refreshes: AtomicU64::new(0),
            tournament_refresh_failures: AtomicU64::new(0),
            tournament_joins: AtomicU64::new(0),
            profile_refreshes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Bump a counter by one
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let counters = [
            ("rounds_started_total", "Rounds the backend accepted", load(&self.rounds_started)),
            ("start_failures_total", "Start requests that failed", load(&self.start_failures)),
            ("catches_total", "Successful catches across all rounds", load(&self.catches_total)),
            (
                "rounds_finished_total",
                "Rounds that reached timer expiry",
                load(&self.rounds_finished),
            ),
            (
                "finish_submissions_total",
                "Finish requests sent to the backend",
                load(&self.finish_submissions),
            ),
            ("finish_failures_total", "Finish requests that failed", load(&self.finish_failures)),
            (
                "finish_duplicates_total",
                "Finish attempts suppressed by the latch",
                load(&self.duplicate_finish_suppressed),
            ),
            (
                "referral_rewards_total",
                "Referral reward notifications raised",
                load(&self.referral_rewards),
            ),
            (
                "tournament_refreshes_total",
                "Successful tournament refreshes",
                load(&self.tournament_refreshes),
            ),
            (
                "tournament_refresh_failures_total",
                "Failed tournament refreshes",
                load(&self.tournament_refresh_failures),
            ),
            (
                "tournament_joins_total",
                "Join requests resolved as joined or already joined",
                load(&self.tournament_joins),
            ),
            (
                "profile_refreshes_total",
                "Successful profile refreshes",
                load(&self.profile_refreshes),
            ),
            ("uptime_seconds", "Client uptime in seconds", self.uptime_seconds()),
        ];

        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP monster_catch_{name} {help}\n\
                 # TYPE monster_catch_{name} counter\n\
                 monster_catch_{name} {value}\n"
            ));
        }

        output
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}
