// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn no_jitter(max_attempts: u32) -> RetryStrategyConfig {
    RetryStrategyConfig {
        max_attempts,
        base_delay_ms: 100,
        max_delay_ms: 1_000,
        jitter: 0.0,
    }
}

#[test]
fn delay_doubles_each_attempt() {
    let config = no_jitter(10);
    assert_eq!(calculate_delay_ms(&config, 1), 100);
    assert_eq!(calculate_delay_ms(&config, 2), 200);
    assert_eq!(calculate_delay_ms(&config, 3), 400);
}

#[test]
fn delay_is_capped_at_max_delay_ms() {
    let config = no_jitter(10);
    assert_eq!(calculate_delay_ms(&config, 10), 1_000);
}

#[test]
fn jitter_keeps_delay_within_the_configured_band() {
    let config = RetryStrategyConfig {
        max_attempts: 3,
        base_delay_ms: 1_000,
        max_delay_ms: 10_000,
        jitter: 0.5,
    };
    for _ in 0..200 {
        let delay = calculate_delay_ms(&config, 1);
        assert!(delay >= 500 && delay <= 1_500, "delay {delay} out of band");
    }
}

#[test]
fn zero_jitter_is_deterministic() {
    let config = no_jitter(3);
    let a = calculate_delay_ms(&config, 2);
    let b = calculate_delay_ms(&config, 2);
    assert_eq!(a, b);
}
