//! Fixed-window request rate limiting

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Login attempts per IP per hour
pub const LOGIN_MAX: u32 = 5;
/// Password resets per key per day
pub const RESET_MAX: u32 = 3;
/// KYC submissions per IP per hour
pub const KYC_MAX: u32 = 30;
/// General requests per IP per 15 minutes
pub const GENERAL_MAX: u32 = 100;

/// Stale windows are dropped opportunistically at this interval
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window counter keyed by caller identity (usually an IP)
pub struct RateLimiter {
    max: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
    last_cleanup: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            windows: Mutex::new(HashMap::new()),
            last_cleanup: Mutex::new(Instant::now()),
        }
    }

    /// Record one request from the key; false when over the limit.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        self.maybe_cleanup(now);

        let mut windows = self.windows.lock().unwrap();
        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= self.window {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        window.count <= self.max
    }

    fn maybe_cleanup(&self, now: Instant) {
        let mut last = self.last_cleanup.lock().unwrap();
        if now.duration_since(*last) < CLEANUP_INTERVAL {
            return;
        }
        *last = now;
        drop(last);

        let window = self.window;
        self.windows
            .lock()
            .unwrap()
            .retain(|_, w| now.duration_since(w.started) < window);
    }
}

/// One limiter per endpoint class, with a master toggle
pub struct RateLimits {
    enabled: bool,
    pub login: RateLimiter,
    pub reset: RateLimiter,
    pub kyc: RateLimiter,
    pub general: RateLimiter,
}

impl RateLimits {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            login: RateLimiter::new(LOGIN_MAX, Duration::from_secs(3600)),
            reset: RateLimiter::new(RESET_MAX, Duration::from_secs(24 * 3600)),
            kyc: RateLimiter::new(KYC_MAX, Duration::from_secs(3600)),
            general: RateLimiter::new(GENERAL_MAX, Duration::from_secs(15 * 60)),
        }
    }

    /// Check against one of the limiters, honoring the master toggle
    pub fn allow(&self, limiter: &RateLimiter, key: &str) -> bool {
        !self.enabled || limiter.check(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trips_on_boundary() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        assert!(limiter.check("5.6.7.8"));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.check("1.2.3.4"));
    }

    #[test]
    fn test_master_toggle_disables_everything() {
        let limits = RateLimits::new(false);
        for _ in 0..LOGIN_MAX * 2 {
            assert!(limits.allow(&limits.login, "1.2.3.4"));
        }
    }
}
