//! Rate Limiting Infrastructure
//!
//! Fixed-window attempt counting per string key. Each key tracks
//! `{count, window_start}`; the count resets when the window elapses and
//! increments on every attempt, regardless of the outcome of the gated
//! operation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate limit policy
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum attempts allowed in the window
    pub max_attempts: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Attempts left in the current window (0 when rejected)
    pub remaining: u32,
    /// Time until the window resets, set when rejected
    pub retry_after: Option<Duration>,
}

/// Per-key attempt window
struct AttemptWindow {
    count: u32,
    window_start: Instant,
}

/// Fixed-window rate limiter over in-process state.
///
/// The window table is process-wide and best-effort: it is not persisted
/// across restarts. Lock poisoning is recovered from, since the table
/// holds no invariants beyond per-entry counters.
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, AttemptWindow>>,
    config: RateLimitConfig,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Record an attempt for `key` and decide whether it may proceed.
    ///
    /// The count increments even when the attempt will be rejected, so a
    /// steady stream of attempts never slips through as windows rotate.
    pub fn check_and_increment(&self, key: &str) -> RateLimitDecision {
        self.check_and_increment_at(key, Instant::now())
    }

    /// Same as [`check_and_increment`], with an explicit check time.
    ///
    /// [`check_and_increment`]: Self::check_and_increment
    pub fn check_and_increment_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let entry = windows
            .entry(key.to_string())
            .or_insert_with(|| AttemptWindow {
                count: 0,
                window_start: now,
            });

        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed > self.config.window {
            entry.count = 1;
            entry.window_start = now;
        } else {
            entry.count += 1;
        }

        if entry.count > self.config.max_attempts {
            RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(self.config.window.saturating_sub(
                    now.saturating_duration_since(entry.window_start),
                )),
            }
        } else {
            RateLimitDecision {
                allowed: true,
                remaining: self.config.max_attempts - entry.count,
                retry_after: None,
            }
        }
    }

    /// Evict windows whose reset time has passed.
    ///
    /// Should run periodically to prevent unbounded memory growth.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&self, now: Instant) {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = self.config.window;
        windows.retain(|_, w| now.saturating_duration_since(w.window_start) <= window);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Start a background eviction task.
    pub fn start_cleanup_task(self: &std::sync::Arc<Self>, interval: Duration) {
        let limiter = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            loop {
                interval_timer.tick().await;
                limiter.cleanup();
            }
        });
    }
}
