use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    pub max_requests: usize,
    pub per: Duration,
}

impl RateLimit {
    /// Budget for core endpoints.
    pub const GENERAL: Self = Self::new(5, Duration::from_millis(2_000));
    /// Budget for `/search/` endpoints.
    pub const SEARCH: Self = Self::new(30, Duration::from_millis(30_000));

    pub const fn new(max_requests: usize, per: Duration) -> Self {
        Self { max_requests, per }
    }
}

/// Admits at most `max_requests` dispatches within any `per` window; excess
/// callers wait for the oldest dispatch to leave the window.
pub struct RateLimiter {
    limit: RateLimit,
    dispatched: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit: RateLimit {
                max_requests: limit.max_requests.max(1),
                per: limit.per,
            },
            dispatched: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn acquire(&self) {
        loop {
            let ready_at = {
                let mut dispatched = self.dispatched.lock().await;
                let now = Instant::now();
                while dispatched
                    .front()
                    .is_some_and(|at| *at + self.limit.per <= now)
                {
                    dispatched.pop_front();
                }
                if dispatched.len() < self.limit.max_requests {
                    dispatched.push_back(now);
                    return;
                }
                match dispatched.front() {
                    Some(oldest) => *oldest + self.limit.per,
                    None => now,
                }
            };
            sleep_until(ready_at).await;
        }
    }
}
