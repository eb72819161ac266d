//! Account state shared with the rest of the client
//!
//! The round and tournament code never own the profile; they push deltas into
//! it through [`ProfileSink`]. [`SharedProfile`] is the in-process store and
//! [`ProfilePoller`] keeps it in step with `GET /users/me`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::metrics::ClientMetrics;
use crate::net::backend::Backend;

/// Authoritative account values as last seen from the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub stars: u64,
    pub coins: u64,
    pub level: u32,
    pub xp: u64,
    pub display_name: Option<String>,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDelta {
    pub stars: Option<u64>,
    pub coins: Option<u64>,
    pub level: Option<u32>,
    pub xp: Option<u64>,
}

impl ProfileDelta {
    pub fn is_empty(&self) -> bool {
        self.stars.is_none() && self.coins.is_none() && self.level.is_none() && self.xp.is_none()
    }

    pub fn coins(coins: u64) -> Self {
        Self {
            coins: Some(coins),
            ..Self::default()
        }
    }
}

/// The only way core logic writes account state
pub trait ProfileSink: Send + Sync {
    fn apply_delta(&self, delta: &ProfileDelta);
}

/// Cloneable handle to the process-wide profile
#[derive(Debug, Clone, Default)]
pub struct SharedProfile {
    inner: Arc<RwLock<Profile>>,
}

impl SharedProfile {
    pub fn new(profile: Profile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(profile)),
        }
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> Profile {
        self.inner.read().clone()
    }

    /// Replace everything with a freshly fetched profile
    pub fn replace(&self, profile: Profile) {
        *self.inner.write() = profile;
    }
}

impl ProfileSink for SharedProfile {
    fn apply_delta(&self, delta: &ProfileDelta) {
        if delta.is_empty() {
            return;
        }
        let mut profile = self.inner.write();
        if let Some(stars) = delta.stars {
            profile.stars = stars;
        }
        if let Some(coins) = delta.coins {
            profile.coins = coins;
        }
        if let Some(level) = delta.level {
            profile.level = level;
        }
        if let Some(xp) = delta.xp {
            profile.xp = xp;
        }
        debug!(
            "Profile updated: stars={} coins={} level={} xp={}",
            profile.stars, profile.coins, profile.level, profile.xp
        );
    }
}

/// Background refresh of the profile on a fixed cadence
pub struct ProfilePoller {
    alive: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ProfilePoller {
    /// Fetch immediately, then every `interval`, until [`ProfilePoller::stop`]
    pub fn spawn<B: Backend>(
        backend: Arc<B>,
        profile: SharedProfile,
        metrics: Arc<ClientMetrics>,
        interval: Duration,
    ) -> Self {
        let alive = Arc::new(AtomicBool::new(true));
        let task_alive = alive.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if !task_alive.load(Ordering::Acquire) {
                    break;
                }

                let result = backend.fetch_profile().await;

                // Results arriving after teardown are dropped
                if !task_alive.load(Ordering::Acquire) {
                    break;
                }

                match result {
                    Ok(fetched) => {
                        profile.replace(fetched);
                        ClientMetrics::incr(&metrics.profile_refreshes);
                    }
                    Err(e) => warn!("Profile refresh failed: {}", e),
                }
            }
            debug!("Profile poller stopped");
        });

        Self { alive, handle }
    }

    /// Stop polling; any in-flight response is discarded
    pub fn stop(&self) {
        self.alive.store(false, Ordering::Release);
        self.handle.abort();
    }
}

impl Drop for ProfilePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
