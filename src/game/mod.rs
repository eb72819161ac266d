//! Round lifecycle: countdown, spawning, session state and reconciliation

pub mod controller;
pub mod reconcile;
pub mod session;
pub mod spawn;
pub mod timer;

pub use controller::{FinishOutcome, RoundController, RoundStarted};
pub use reconcile::{FinishSubmission, ReconciliationResult, Reconciler};
pub use session::{CatchOutcome, Hud, RoundError, RoundSession, RoundStatus, SessionId};
pub use spawn::{Catalog, MonsterKind, SpawnGenerator, SpawnSource, SpawnTarget};
pub use timer::{CountdownTimer, TimerState, TimerTick};
