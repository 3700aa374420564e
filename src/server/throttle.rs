//! Accept throttling
//!
//! Sliding-window limit on how many connections the accept loop takes in
//! per time window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Sliding-window accept limiter
pub struct AcceptThrottle {
    accepted: VecDeque<Instant>,
    max_accepts: usize,
    window: Duration,
}

impl AcceptThrottle {
    pub fn new(max_accepts: usize, window: Duration) -> Self {
        Self {
            accepted: VecDeque::new(),
            max_accepts,
            window,
        }
    }

    /// Record an accept at `now`.
    pub fn record(&mut self, now: Instant) {
        self.expire(now);
        self.accepted.push_back(now);
    }

    /// How long to wait from `now` before the next accept fits the window.
    pub fn delay(&mut self, now: Instant) -> Option<Duration> {
        self.expire(now);
        if self.accepted.len() < self.max_accepts {
            return None;
        }
        self.accepted
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
    }

    /// Sleep until another accept is allowed.
    pub async fn wait(&mut self) {
        if let Some(delay) = self.delay(Instant::now()) {
            tokio::time::sleep(delay).await;
        }
    }

    fn expire(&mut self, now: Instant) {
        // Remove old accepts
        while let Some(&oldest) = self.accepted.front() {
            if now.duration_since(oldest) >= self.window {
                self.accepted.pop_front();
            } else {
                break;
            }
        }
    }
}
