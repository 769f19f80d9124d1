use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::config::Identity;

/// Single shared pacing source for every request the engine issues.
///
/// All streams (and the reaper's retries on their behalf) draw from one
/// limiter, because the upstream contract is an aggregate budget across
/// the whole client, not a per-source one. `acquire` hands out grant
/// slots spaced at least the effective interval apart no matter how many
/// callers are waiting.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// The caller-requested interval is clamped up to the identity's
    /// compliance floor; asking for more than the floor is honored.
    pub fn new(requested: Duration, identity: Identity) -> Self {
        Self {
            interval: requested.max(identity.floor()),
            next_grant: Mutex::new(None),
        }
    }

    /// Effective interval after clamping.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until a request slot is available.
    ///
    /// Slot reservation happens under the lock but the wait itself does
    /// not, so waiters queue on the mutex and each one sleeps until its
    /// own grant instant. No waiter can starve under a finite number of
    /// streams.
    pub async fn acquire(&self) {
        let grant = {
            let mut next = self.next_grant.lock().await;
            let now = Instant::now();
            let grant = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(grant + self.interval);
            grant
        };
        sleep_until(grant).await;
    }

    /// Limiter that admits immediately, for exercising the layers above
    /// it without waiting out the compliance floor.
    #[cfg(test)]
    pub(crate) fn unpaced() -> Self {
        Self {
            interval: Duration::ZERO,
            next_grant: Mutex::new(None),
        }
    }
}
