use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-window request limiter keyed by client address.
#[derive(Clone)]
pub struct RequestLimiter {
    hits: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RequestLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Count a request from `key`. Returns false if it exceeds the limit;
    /// rejected requests are not counted.
    pub fn check_and_record(&self, key: &str) -> bool {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> bool {
        let mut map = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        let hits = map.entry(key.to_string()).or_default();
        hits.retain(|t| now.duration_since(*t) < self.window);

        if hits.len() >= self.max_requests {
            return false;
        }
        hits.push(now);
        true
    }

    /// Drop keys with no hits inside the window.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut map = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, hits| {
            hits.retain(|t| now.duration_since(*t) < self.window);
            !hits.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Request limits applied by the security middleware.
#[derive(Clone)]
pub struct RequestLimits {
    pub global: RequestLimiter,
    pub login: RequestLimiter,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            global: RequestLimiter::per_minute(100),
            login: RequestLimiter::per_minute(5),
        }
    }
}
