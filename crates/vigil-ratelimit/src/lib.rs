//! Sliding-window failure counting with lockout.
//!
//! Each key (an IP string, an account id string — the limiter doesn't care)
//! moves through a small state machine:
//!
//! ```text
//!   CLEAN ──(failure)──→ ACCUMULATING ──(max reached)──→ LOCKED
//!     ↑                       │                             │
//!     └──(window expires)─────┘        (lockout expires)────┘
//! ```
//!
//! - **CLEAN**: no record exists. The first failure opens a window.
//! - **ACCUMULATING**: failures inside the window are counted. A failure
//!   after the window expired starts a fresh window at count 1.
//! - **LOCKED**: the count reached the maximum; every check reports the
//!   remaining lockout until it expires, at which point the record is
//!   lazily dropped. Lock state wins over a stale window: a record can have
//!   an expired window *and* an active lock, and it stays locked.
//!
//! All operations take an explicit `now` so callers own the clock. The
//! session layer passes `Instant::now()`; tests pass whatever instant
//! proves the property at hand, no sleeping.
//!
//! Internally one mutex guards the map: operations on a key are
//! linearizable, and the increment-then-threshold-check in
//! [`RateLimiter::record_failure`] is a single critical section so two
//! racing failures can't both observe "one below max".

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Outcome of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempts {
    /// Attempts left before this key locks.
    Remaining(u32),
    /// The key just reached the maximum and is now locked out.
    Locked,
}

impl Attempts {
    /// Remaining attempts as a plain count, `0` when locked. Callers that
    /// track several keys report the minimum of these.
    pub fn remaining(self) -> u32 {
        match self {
            Self::Remaining(n) => n,
            Self::Locked => 0,
        }
    }
}

/// Per-key attempt bookkeeping. Private: only the limiter mutates it.
#[derive(Debug)]
struct AttemptRecord {
    window_start: Instant,
    count: u32,
    locked_until: Option<Instant>,
}

/// Sliding-window failure counter with lockout.
///
/// Shared by reference across the session layer; interior mutability via
/// a single `Mutex`. The map only ever holds keys with live windows or
/// lockouts — expired records are dropped lazily on read and in bulk by
/// [`cleanup`](Self::cleanup), so memory is bounded by the number of
/// recently-failing keys.
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    lockout: Duration,
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration, lockout: Duration) -> Self {
        Self {
            // A limiter that locks on the 0th failure is nonsense; floor at 1.
            max_attempts: max_attempts.max(1),
            window,
            lockout,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Remaining lockout for `key`, or `Duration::ZERO` when not locked.
    ///
    /// Lazily drops the record when its lockout or window has expired, so
    /// a key that served its time reads as CLEAN without waiting for
    /// [`cleanup`](Self::cleanup).
    pub fn locked_remaining(&self, key: &str, now: Instant) -> Duration {
        let mut records = self.records.lock().expect("ratelimit mutex poisoned");
        let Some(rec) = records.get(key) else {
            return Duration::ZERO;
        };

        if let Some(until) = rec.locked_until {
            if now < until {
                return until - now;
            }
            // Lockout served; forget the key entirely.
            records.remove(key);
            return Duration::ZERO;
        }

        if now.duration_since(rec.window_start) > self.window {
            records.remove(key);
        }
        Duration::ZERO
    }

    /// Records a failed attempt against `key`.
    ///
    /// Starts a fresh window when none is live, otherwise increments the
    /// count; reaching the maximum locks the key until `now + lockout`.
    /// The whole decision happens under one lock so a concurrent failure
    /// on the same key can't slip past the threshold.
    pub fn record_failure(&self, key: &str, now: Instant) -> Attempts {
        let mut records = self.records.lock().expect("ratelimit mutex poisoned");

        let rec = records
            .entry(key.to_string())
            .and_modify(|rec| {
                if rec.locked_until.is_none()
                    && now.duration_since(rec.window_start) > self.window
                {
                    // Window expired with no lock: this failure opens a
                    // fresh window.
                    rec.window_start = now;
                    rec.count = 1;
                } else {
                    rec.count += 1;
                }
            })
            .or_insert(AttemptRecord {
                window_start: now,
                count: 1,
                locked_until: None,
            });

        if rec.count >= self.max_attempts {
            rec.locked_until = Some(now + self.lockout);
            warn!(key, lockout_secs = self.lockout.as_secs(), "key locked out");
            return Attempts::Locked;
        }

        Attempts::Remaining(self.max_attempts - rec.count)
    }

    /// Forgets `key` entirely. Called on successful authentication.
    pub fn clear(&self, key: &str) {
        self.records
            .lock()
            .expect("ratelimit mutex poisoned")
            .remove(key);
    }

    /// Drops every record whose lockout has expired, or whose window has
    /// expired without a lockout. Run periodically to bound memory; the
    /// exact cadence doesn't matter for correctness because reads are
    /// lazily expiring anyway.
    pub fn cleanup(&self, now: Instant) {
        let mut records = self.records.lock().expect("ratelimit mutex poisoned");
        let before = records.len();
        records.retain(|_, rec| match rec.locked_until {
            Some(until) => now <= until,
            None => now.duration_since(rec.window_start) <= self.window,
        });
        let dropped = before - records.len();
        if dropped > 0 {
            debug!(dropped, tracked = records.len(), "rate limiter cleanup");
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.records.lock().expect("ratelimit mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(300);
    const LOCKOUT: Duration = Duration::from_secs(600);

    fn limiter(max: u32) -> RateLimiter {
        RateLimiter::new(max, WINDOW, LOCKOUT)
    }

    #[test]
    fn test_locked_remaining_unknown_key_is_zero() {
        let rl = limiter(3);
        assert_eq!(rl.locked_remaining("ip:a", Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_record_failure_counts_down() {
        let rl = limiter(3);
        let now = Instant::now();
        assert_eq!(rl.record_failure("k", now), Attempts::Remaining(2));
        assert_eq!(rl.record_failure("k", now), Attempts::Remaining(1));
        assert_eq!(rl.record_failure("k", now), Attempts::Locked);
    }

    #[test]
    fn test_max_failures_locks_with_positive_remaining() {
        let rl = limiter(3);
        let now = Instant::now();
        for _ in 0..3 {
            rl.record_failure("k", now);
        }
        let remaining = rl.locked_remaining("k", now);
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= LOCKOUT);
    }

    #[test]
    fn test_lockout_expiry_returns_to_clean() {
        let rl = limiter(3);
        let now = Instant::now();
        for _ in 0..3 {
            rl.record_failure("k", now);
        }

        // Simulated clock: one tick past the lockout.
        let later = now + LOCKOUT + Duration::from_millis(1);
        assert_eq!(rl.locked_remaining("k", later), Duration::ZERO);
        // The record was lazily dropped, so the next failure opens a
        // fresh window.
        assert_eq!(rl.record_failure("k", later), Attempts::Remaining(2));
    }

    #[test]
    fn test_window_expiry_starts_fresh_window() {
        let rl = limiter(3);
        let now = Instant::now();
        rl.record_failure("k", now);
        rl.record_failure("k", now);

        let later = now + WINDOW + Duration::from_millis(1);
        // Old failures fell out of the window; count restarts at 1.
        assert_eq!(rl.record_failure("k", later), Attempts::Remaining(2));
    }

    #[test]
    fn test_lock_takes_precedence_over_stale_window() {
        // Window shorter than lockout: the window expires while the lock
        // is still active. The key must stay locked.
        let rl = RateLimiter::new(2, Duration::from_secs(1), Duration::from_secs(100));
        let now = Instant::now();
        rl.record_failure("k", now);
        assert_eq!(rl.record_failure("k", now), Attempts::Locked);

        let past_window = now + Duration::from_secs(5);
        assert!(rl.locked_remaining("k", past_window) > Duration::ZERO);
    }

    #[test]
    fn test_clear_resets_key() {
        let rl = limiter(3);
        let now = Instant::now();
        rl.record_failure("k", now);
        rl.record_failure("k", now);
        rl.clear("k");
        assert_eq!(rl.record_failure("k", now), Attempts::Remaining(2));
    }

    #[test]
    fn test_keys_are_independent() {
        let rl = limiter(2);
        let now = Instant::now();
        rl.record_failure("ip:a", now);
        assert_eq!(rl.record_failure("ip:a", now), Attempts::Locked);
        // A different key is untouched.
        assert_eq!(rl.record_failure("id:b", now), Attempts::Remaining(1));
    }

    #[test]
    fn test_cleanup_drops_expired_keeps_live() {
        let rl = limiter(2);
        let now = Instant::now();
        rl.record_failure("stale-window", now);
        rl.record_failure("locked", now);
        rl.record_failure("locked", now); // locked until now + LOCKOUT
        rl.record_failure("fresh", now + WINDOW);

        rl.cleanup(now + WINDOW + Duration::from_millis(1));

        // "stale-window" expired; "locked" and "fresh" survive.
        assert_eq!(rl.tracked_keys(), 2);
        assert!(rl.locked_remaining("locked", now + WINDOW) > Duration::ZERO);
    }

    #[test]
    fn test_cleanup_drops_expired_lockouts() {
        let rl = limiter(1);
        let now = Instant::now();
        rl.record_failure("k", now);
        rl.cleanup(now + LOCKOUT + Duration::from_millis(1));
        assert_eq!(rl.tracked_keys(), 0);
    }

    #[test]
    fn test_concurrent_failures_never_overshoot_threshold() {
        use std::sync::Arc;
        use std::thread;

        // 8 threads × 4 failures on the same key: exactly one transition
        // to Locked per window would be ideal, but the hard requirement is
        // that no thread observes a remaining count after the lock is set.
        let rl = Arc::new(limiter(16));
        let now = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let rl = Arc::clone(&rl);
            handles.push(thread::spawn(move || {
                let mut results = Vec::new();
                for _ in 0..4 {
                    results.push(rl.record_failure("k", now));
                }
                results
            }));
        }

        let all: Vec<Attempts> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        // 32 failures against max 16: every result at or past the
        // threshold must be Locked, and remaining counts must be distinct
        // below it (each failure observed a unique count).
        let locked = all.iter().filter(|a| **a == Attempts::Locked).count();
        assert_eq!(locked, 32 - 15, "exactly the failures at/past max lock");
    }
}
