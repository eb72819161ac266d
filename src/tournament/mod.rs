//! Hourly tournament: window evaluation and the join protocol

pub mod tracker;
pub mod window;

pub use tracker::{JoinError, JoinOutcome, TournamentTracker};
pub use window::{evaluate, JoinEligibility, Participant, TournamentStatus, TournamentWindow};
