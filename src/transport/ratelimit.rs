use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-endpoint request budget within a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// In-memory windowed counters, one per endpoint path.
///
/// Owned by the client that created it — never process-global — so
/// concurrent tests and independent clients cannot contaminate each other.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Take one slot for `endpoint`. Returns false when the window budget
    /// is spent; the window restarts once its duration elapses.
    pub fn try_acquire(&self, endpoint: &str) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        let window = windows.entry(endpoint.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.limit.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.limit.max_requests {
            return false;
        }
        window.count += 1;
        true
    }

    /// Drop all counters.
    pub fn reset(&self) {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
