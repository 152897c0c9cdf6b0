// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tf_core::{Clock, KeyId};

const WINDOW_MS: u64 = 60_000;

/// Which budget dimension a reservation was rejected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDimension {
    Rpm,
    Tpm,
}

/// Result of a reservation attempt (spec §4.2 step 3-4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved,
    LimitHit {
        dimension: LimitDimension,
        retry_after_ms: u64,
    },
    CooldownActive {
        until_epoch_ms: u64,
    },
}

impl ReserveOutcome {
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved)
    }
}

/// Atomic per-key RPM/TPM budget primitive (spec §4.2).
///
/// Implementations must make `reserve` race-free across concurrent
/// callers — "either a scripted server-side sequence against a shared
/// store, or a local mutex guarded counter in the in-process variant."
#[async_trait::async_trait]
pub trait RateLimiterStore: Send + Sync {
    /// Atomically check-and-consume budget for one request estimated to
    /// cost `estimated_tokens`. `rpm_limit`/`tpm_limit` of `None` means
    /// unbounded on that dimension.
    async fn reserve(
        &self,
        key_id: &KeyId,
        estimated_tokens: u32,
        rpm_limit: Option<u32>,
        tpm_limit: Option<u32>,
    ) -> ReserveOutcome;

    /// Adjust the token counter downward after a real response reports
    /// fewer tokens than estimated. Never adjusts upward (spec §4.2
    /// "avoid double-charging").
    async fn correct(&self, key_id: &KeyId, estimated_tokens: u32, actual_tokens: u32);

    /// Place a key in cooldown until `until_epoch_ms`. Reservations fail
    /// immediately while cooldown is active, regardless of budget.
    async fn cooldown(&self, key_id: &KeyId, until_epoch_ms: u64);

    /// Whether this key is currently in cooldown.
    async fn cooldown_active(&self, key_id: &KeyId) -> bool;

    /// The epoch-ms a key's cooldown lifts, if it is currently in one. Used
    /// by the router to report the earliest retry time when no candidate
    /// key is eligible (spec §4.3 "report no-key-available with the
    /// earliest cooldown-expiry time").
    async fn cooldown_until_ms(&self, key_id: &KeyId) -> Option<u64>;

    /// Remaining unused fraction of RPM and TPM budget in the current
    /// window, used by the router's "highest remaining capacity"
    /// tie-break (spec §4.3).
    async fn remaining_capacity(
        &self,
        key_id: &KeyId,
        rpm_limit: Option<u32>,
        tpm_limit: Option<u32>,
    ) -> f64;
}

#[derive(Debug, Clone, Default)]
struct KeyBucket {
    minute_bucket: u64,
    rpm_count: u32,
    tpm_count: u32,
    cooldown_until_ms: u64,
}

impl KeyBucket {
    fn roll_if_stale(&mut self, minute_bucket: u64) {
        if self.minute_bucket != minute_bucket {
            self.minute_bucket = minute_bucket;
            self.rpm_count = 0;
            self.tpm_count = 0;
        }
    }
}

/// In-process rate-limiter store guarded by a single mutex over the whole
/// key map (spec §4.2 "local mutex guarded counter").
pub struct InMemoryRateLimiterStore<C> {
    clock: C,
    buckets: Arc<Mutex<HashMap<String, KeyBucket>>>,
}

impl<C: Clock> InMemoryRateLimiterStore<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn minute_bucket(&self, now_ms: u64) -> u64 {
        now_ms / WINDOW_MS
    }
}

#[async_trait::async_trait]
impl<C: Clock> RateLimiterStore for InMemoryRateLimiterStore<C> {
    async fn reserve(
        &self,
        key_id: &KeyId,
        estimated_tokens: u32,
        rpm_limit: Option<u32>,
        tpm_limit: Option<u32>,
    ) -> ReserveOutcome {
        let now = self.clock.epoch_ms();
        let minute = self.minute_bucket(now);
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key_id.as_str().to_string()).or_default();

        if bucket.cooldown_until_ms > now {
            return ReserveOutcome::CooldownActive {
                until_epoch_ms: bucket.cooldown_until_ms,
            };
        }

        bucket.roll_if_stale(minute);

        let window_rollover_ms = (minute + 1) * WINDOW_MS - now;

        if let Some(limit) = rpm_limit {
            if bucket.rpm_count + 1 > limit {
                return ReserveOutcome::LimitHit {
                    dimension: LimitDimension::Rpm,
                    retry_after_ms: window_rollover_ms,
                };
            }
        }
        if let Some(limit) = tpm_limit {
            if bucket.tpm_count + estimated_tokens > limit {
                return ReserveOutcome::LimitHit {
                    dimension: LimitDimension::Tpm,
                    retry_after_ms: window_rollover_ms,
                };
            }
        }

        bucket.rpm_count += 1;
        bucket.tpm_count += estimated_tokens;
        ReserveOutcome::Reserved
    }

    async fn correct(&self, key_id: &KeyId, estimated_tokens: u32, actual_tokens: u32) {
        if actual_tokens >= estimated_tokens {
            return;
        }
        let overcharge = estimated_tokens - actual_tokens;
        let mut buckets = self.buckets.lock();
        if let Some(bucket) = buckets.get_mut(key_id.as_str()) {
            bucket.tpm_count = bucket.tpm_count.saturating_sub(overcharge);
        }
    }

    async fn cooldown(&self, key_id: &KeyId, until_epoch_ms: u64) {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key_id.as_str().to_string()).or_default();
        bucket.cooldown_until_ms = bucket.cooldown_until_ms.max(until_epoch_ms);
    }

    async fn cooldown_active(&self, key_id: &KeyId) -> bool {
        let now = self.clock.epoch_ms();
        let buckets = self.buckets.lock();
        buckets
            .get(key_id.as_str())
            .map(|b| b.cooldown_until_ms > now)
            .unwrap_or(false)
    }

    async fn cooldown_until_ms(&self, key_id: &KeyId) -> Option<u64> {
        let now = self.clock.epoch_ms();
        let buckets = self.buckets.lock();
        buckets.get(key_id.as_str()).and_then(|b| {
            if b.cooldown_until_ms > now {
                Some(b.cooldown_until_ms)
            } else {
                None
            }
        })
    }

    async fn remaining_capacity(
        &self,
        key_id: &KeyId,
        rpm_limit: Option<u32>,
        tpm_limit: Option<u32>,
    ) -> f64 {
        let now = self.clock.epoch_ms();
        let minute = self.minute_bucket(now);
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key_id.as_str().to_string()).or_default();
        bucket.roll_if_stale(minute);

        let rpm_fraction = match rpm_limit {
            Some(limit) if limit > 0 => {
                1.0 - (bucket.rpm_count as f64 / limit as f64).min(1.0)
            }
            _ => 1.0,
        };
        let tpm_fraction = match tpm_limit {
            Some(limit) if limit > 0 => {
                1.0 - (bucket.tpm_count as f64 / limit as f64).min(1.0)
            }
            _ => 1.0,
        };
        rpm_fraction.max(tpm_fraction)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
