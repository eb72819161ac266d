//! Monster Catch Client Library
//!
//! Client-side core of a timed "catch the monster" game backed by a remote
//! authority: round lifecycle, weighted spawning, exactly-once finish
//! reconciliation and the hourly tournament window.
//!
//! # Features
//!
//! - `tournament` - Tournament window evaluation, polling and joining (enabled by default)

pub mod config;
pub mod constants;
pub mod events;
pub mod game;
pub mod metrics;
pub mod net;
pub mod profile;

// Feature-gated modules (enabled by default)
#[cfg(feature = "tournament")]
pub mod tournament;
