use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// In-memory sliding-window limiter for login attempts.
/// Keys look like "login:<ip_hash>"; timestamps outside the window are
/// pruned from the front of each queue on every check.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the attempt is allowed, recording it. A denied
    /// attempt is not recorded, so being blocked never extends the block.
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.entries.lock().unwrap();
        let now = Instant::now();
        let cutoff = now - window;

        let attempts = map.entry(key.to_string()).or_default();
        while attempts.front().is_some_and(|t| *t <= cutoff) {
            attempts.pop_front();
        }

        if (attempts.len() as u64) < max_attempts {
            attempts.push_back(now);
            true
        } else {
            false
        }
    }

    /// Drops every key whose newest attempt is older than max_age. Called
    /// from the background sweeper so idle keys don't accumulate.
    pub fn cleanup(&self, max_age: Duration) {
        let mut map = self.entries.lock().unwrap();
        let now = Instant::now();
        map.retain(|_, attempts| {
            attempts
                .back()
                .is_some_and(|newest| now.duration_since(*newest) < max_age)
        });
    }
}
