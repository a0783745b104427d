//! Fixed inter-request pacing.
//!
//! Every target after the first waits `delay` before its fetch, whether the
//! page then comes from the network or the cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::clock::Clock;

/// Enforces a fixed delay between successive target fetches
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    delay: Duration,
    state: Mutex<RateLimiterState>,
}

struct RateLimiterState {
    acquired: u64,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `clock` - Time source used for sleeping
    /// * `delay` - Pause inserted before every target except the first
    pub fn new(clock: Arc<dyn Clock>, delay: Duration) -> Self {
        Self {
            clock,
            delay,
            state: Mutex::new(RateLimiterState { acquired: 0 }),
        }
    }

    /// Wait for the next slot
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        if state.acquired > 0 && !self.delay.is_zero() {
            self.clock.sleep(self.delay).await;
        }
        state.acquired += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::new(clock.clone(), Duration::from_millis(300));

        limiter.acquire().await;
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_successive_acquires_are_spaced() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::new(clock.clone(), Duration::from_millis(300));

        for _ in 0..4 {
            limiter.acquire().await;
        }

        assert_eq!(clock.sleeps(), vec![Duration::from_millis(300); 3]);
    }

    #[tokio::test]
    async fn test_zero_delay_never_sleeps() {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::new(clock.clone(), Duration::ZERO);

        limiter.acquire().await;
        limiter.acquire().await;
        assert!(clock.sleeps().is_empty());
    }
}
