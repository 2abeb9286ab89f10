use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Sliding window limiter: at most `max_requests` acquisitions in any rolling `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            timestamps: VecDeque::with_capacity(max_requests),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Blocks until another request fits in the window and records it. Returns the time
    /// spent sleeping.
    pub fn acquire(&mut self) -> Duration {
        let mut waited = Duration::ZERO;
        let mut now = Instant::now();
        self.evict_expired(now);

        if self.timestamps.len() >= self.max_requests
            && let Some(oldest) = self.timestamps.front()
        {
            waited = self.window.saturating_sub(now.duration_since(*oldest));
            if !waited.is_zero() {
                debug!("Rate limit reached, sleeping {:?}", waited);
                thread::sleep(waited);
            }
            now = Instant::now();
            self.evict_expired(now);
            // Sleeping restores the window for the oldest entry even if the clock
            // reports it a hair early.
            while self.timestamps.len() >= self.max_requests {
                self.timestamps.pop_front();
            }
        }

        self.timestamps.push_back(now);
        waited
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}
