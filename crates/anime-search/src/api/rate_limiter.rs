//! Client-side request throttle.
//!
//! Enforces both a minimum spacing between requests (per-second budget)
//! and a sliding one-minute window, so the client stays under the catalog
//! API's published limits instead of collecting 429s.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter with dual constraints (per-second and per-minute)
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between two requests
    min_interval: Duration,
    /// Maximum requests per sliding minute
    max_per_minute: usize,
    /// Last request timestamp
    last_request: Option<Instant>,
    /// Request timestamps in the last minute, oldest first
    recent_requests: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(max_per_second: f64, max_per_minute: u32) -> Self {
        let max_per_minute = max_per_minute.max(1) as usize;
        Self {
            min_interval: Duration::from_secs_f64(1.0 / max_per_second.max(f64::EPSILON)),
            max_per_minute,
            last_request: None,
            recent_requests: VecDeque::with_capacity(max_per_minute),
        }
    }

    /// Wait until a request may be sent, then record it.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&mut self) -> Duration {
        let start = Instant::now();
        let mut ready_at = start;

        self.evict_expired(start);

        if self.recent_requests.len() >= self.max_per_minute {
            if let Some(&oldest) = self.recent_requests.front() {
                ready_at = ready_at.max(oldest + WINDOW);
            }
        }

        if let Some(last) = self.last_request {
            ready_at = ready_at.max(last + self.min_interval);
        }

        if ready_at > start {
            tracing::debug!(
                wait_ms = (ready_at - start).as_millis() as u64,
                "Rate limit: delaying request"
            );
            sleep_until(ready_at).await;
        }

        let request_time = Instant::now();
        self.evict_expired(request_time);
        self.last_request = Some(request_time);
        self.recent_requests.push_back(request_time);

        request_time - start
    }

    /// Get the current number of requests in the last minute
    pub fn current_minute_count(&mut self) -> usize {
        self.evict_expired(Instant::now());
        self.recent_requests.len()
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(&oldest) = self.recent_requests.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.recent_requests.pop_front();
            } else {
                break;
            }
        }
    }
}
