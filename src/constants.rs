//! Client-wide constants, grouped by concern.

/// Round timing constants
pub mod timing {
    /// Countdown polling cadence in milliseconds
    pub const TICK_INTERVAL_MS: u64 = 100;
    /// Round length used when the backend omits `roundDurationMs`
    pub const DEFAULT_ROUND_DURATION_MS: u64 = 60_000;
}

/// Spawn area bounds, in percent of the play surface
pub mod spawn {
    pub const X_MIN: f64 = 15.0;
    pub const X_MAX: f64 = 85.0;
    pub const Y_MIN: f64 = 20.0;
    pub const Y_MAX: f64 = 80.0;
}

/// Background polling cadences
pub mod polling {
    /// Tournament window refresh interval in seconds
    pub const TOURNAMENT_SECS: u64 = 15;
    /// Profile refresh interval in seconds
    pub const PROFILE_SECS: u64 = 10;
}

/// Backend defaults
pub mod backend {
    pub const DEFAULT_BASE_URL: &str = "https://monstercatch-production.up.railway.app";
    /// Per-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    /// `reason` value the join endpoint uses for an existing membership
    pub const ALREADY_JOINED: &str = "ALREADY_JOINED";
}
