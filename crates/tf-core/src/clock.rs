// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction so scheduling, cooldowns, and window buckets are
//! deterministic in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of time for anything that records a timestamp or measures a
/// deadline. Production code uses [`SystemClock`]; tests use [`FakeClock`]
/// so window rollovers, cooldown expiries, and retry backoff are exercised
/// without real sleeps.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;

    /// A monotonic instant, used for deadlines and elapsed-time math.
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`SystemTime`] / [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A controllable clock for tests. `now()` still returns a real `Instant`
/// (it cannot be faked without `unsafe`), but `epoch_ms()` is driven
/// explicitly via [`FakeClock::advance`] / [`FakeClock::set`], which is
/// what window-bucket and cooldown-expiry logic actually keys off.
#[derive(Debug, Clone)]
pub struct FakeClock {
    epoch_ms: Arc<AtomicU64>,
    base: Instant,
}

impl FakeClock {
    pub fn new(epoch_ms: u64) -> Self {
        Self {
            epoch_ms: Arc::new(AtomicU64::new(epoch_ms)),
            base: Instant::now(),
        }
    }

    pub fn advance_ms(&self, delta: u64) {
        self.epoch_ms.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set(&self, epoch_ms: u64) {
        self.epoch_ms.store(epoch_ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }

    fn now(&self) -> Instant {
        self.base
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
