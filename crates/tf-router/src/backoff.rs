// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff with jitter between router retry attempts
//! (spec §4.3 "Stopping").

use serde::{Deserialize, Serialize};

/// Backoff shape for retries between credential-router attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryStrategyConfig {
    /// Hard cap on attempts per [`crate::CredentialRouter::dispatch`] call
    /// (spec §4.3 default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// 0.0 = no jitter, 1.0 = delay is uniformly sampled from `[0, 2*delay]`.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_jitter() -> f64 {
    0.3
}

impl Default for RetryStrategyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

/// Delay before retry attempt `attempt` (1-indexed), exponential in the
/// attempt number and capped at `max_delay_ms`.
pub fn calculate_delay_ms(config: &RetryStrategyConfig, attempt: u32) -> u64 {
    let pow = attempt.saturating_sub(1).min(16);
    let raw = config.base_delay_ms.saturating_mul(1u64 << pow);
    let capped = raw.min(config.max_delay_ms);
    if config.jitter <= 0.0 {
        return capped;
    }
    apply_jitter(capped, config.jitter)
}

fn apply_jitter(delay_ms: u64, jitter: f64) -> u64 {
    use rand::Rng;
    let range = 2.0 * jitter;
    let mut rng = rand::rng();
    let sample: f64 = rng.random();
    let factor = 1.0 - jitter + sample * range;
    ((delay_ms as f64) * factor).round().max(0.0) as u64
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
