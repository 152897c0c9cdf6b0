// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_spec_table() {
    let cfg = Config::default();
    assert!(cfg.router.enabled);
    assert_eq!(cfg.router.max_retries, 3);
    assert_eq!(cfg.scheduler.max_branch_depth, 2);
    assert_eq!(cfg.sandbox.timeout_s, 600);
    assert_eq!(cfg.bus.transport, BusTransport::InMemory);
    assert!(cfg.artifact.scan_secrets);
}

#[test]
fn partial_toml_fills_missing_sections_with_defaults() {
    let toml_text = r#"
        [router]
        max_retries = 5
    "#;
    let cfg: Config = toml::from_str(toml_text).unwrap();
    assert_eq!(cfg.router.max_retries, 5);
    assert!(cfg.router.enabled);
    assert_eq!(cfg.scheduler.worker_pool_size, 4);
}

#[test]
fn load_missing_file_is_a_read_error() {
    let err = Config::load("/nonexistent/path/tf.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn bus_transport_round_trips_as_kebab_case() {
    let json = serde_json::to_value(BusTransport::Remote).unwrap();
    assert_eq!(json, "remote");
}
