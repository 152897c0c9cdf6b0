// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn request(output_dir: &str) -> RunRequest {
    RunRequest {
        strategy_file: "strategy.py".to_string(),
        test_files: vec!["test_strategy.py".to_string()],
        fixtures: Vec::new(),
        output_dir: output_dir.to_string(),
        timeout_s: 10,
        seed: None,
    }
}

fn execution(exit_code: i32) -> RawExecution {
    RawExecution {
        exit_code,
        duration_s: 0.5,
        stdout: Vec::new(),
        stderr: Vec::new(),
        timed_out: false,
    }
}

fn write_report(output_dir: &Path, body: &str) {
    fs::write(output_dir.join(REPORT_FILENAME), body).unwrap();
}

#[tokio::test]
async fn passed_when_all_tests_and_checks_pass() {
    let dir = tempdir().unwrap();
    write_report(dir.path(), r#"{"tests":[{"name":"t1","passed":true}],"metrics":{"sharpe":1.2}}"#);

    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(execution(0)));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::Passed);
    assert!(result.failures.is_empty());
    assert_eq!(result.metrics.get("sharpe"), Some(&1.2));
}

#[tokio::test]
async fn test_failed_when_a_test_fails() {
    let dir = tempdir().unwrap();
    write_report(
        dir.path(),
        r#"{"tests":[{"name":"t1","passed":false,"message":"assert 1 == 2"}]}"#,
    );

    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(execution(1)));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::TestFailed);
    assert_eq!(result.failures[0].name, "t1");
}

#[tokio::test]
async fn static_failed_takes_priority_over_test_failures() {
    let dir = tempdir().unwrap();
    write_report(
        dir.path(),
        r#"{"tests":[{"name":"t1","passed":false}],"static_checks":[{"name":"lint","passed":false,"message":"E501"}]}"#,
    );

    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(execution(1)));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::StaticFailed);
    assert_eq!(result.failures[0].name, "lint");
}

#[tokio::test]
async fn timeout_is_classified_without_consulting_the_report() {
    let dir = tempdir().unwrap();
    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(RawExecution {
        exit_code: -1,
        duration_s: 10.0,
        stdout: b"last progress line\n".to_vec(),
        stderr: Vec::new(),
        timed_out: true,
    }));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::Timeout);
    assert_eq!(result.failures[0].stack_excerpt.as_deref(), Some("last progress line"));
}

#[tokio::test]
async fn missing_report_is_schema_invalid() {
    let dir = tempdir().unwrap();
    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(execution(0)));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::SchemaInvalid);
    assert!(result.failures[0].message.contains("missing-report"));
}

#[tokio::test]
async fn malformed_report_is_schema_invalid() {
    let dir = tempdir().unwrap();
    write_report(dir.path(), "not json");
    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(execution(0)));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::SchemaInvalid);
}

#[tokio::test]
async fn nonzero_exit_with_clean_report_is_sandbox_error() {
    let dir = tempdir().unwrap();
    write_report(dir.path(), r#"{"tests":[]}"#);
    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(execution(137)));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::SandboxError);
}

#[tokio::test]
async fn runner_failure_is_folded_into_sandbox_error_classification() {
    let dir = tempdir().unwrap();
    let runner = FakeContainerRunner::new();
    runner.push_response(Err(SandboxError::RunnerFailure("container failed to start".to_string())));
    let gateway = SandboxGateway::new(runner);

    let result = gateway.run(request(dir.path().to_str().unwrap())).await.unwrap();
    assert_eq!(result.status, ResultClass::SandboxError);
    assert!(result.failures[0].message.contains("container failed to start"));
}

#[tokio::test]
async fn determinism_check_reports_ok_when_metrics_match() {
    let base = tempdir().unwrap();
    let runner = FakeContainerRunner::new();
    for _ in 0..2 {
        runner.push_response(Ok(execution(0)));
    }
    let gateway = SandboxGateway::new(runner);

    for i in 0..2 {
        let run_dir = base.path().join(format!("determinism_run_{i}"));
        fs::create_dir_all(&run_dir).unwrap();
        write_report(&run_dir, r#"{"metrics":{"sharpe":1.5}}"#);
    }

    let report = gateway
        .check_determinism(request(base.path().to_str().unwrap()), 42, 2)
        .await
        .unwrap();
    assert!(report.ok, "diffs: {:?}", report.diffs);
}

#[tokio::test]
async fn determinism_check_reports_diffs_when_metrics_diverge() {
    let base = tempdir().unwrap();
    let runner = FakeContainerRunner::new();
    for _ in 0..2 {
        runner.push_response(Ok(execution(0)));
    }
    let gateway = SandboxGateway::new(runner);

    let run0 = base.path().join("determinism_run_0");
    fs::create_dir_all(&run0).unwrap();
    write_report(&run0, r#"{"metrics":{"sharpe":1.5}}"#);
    let run1 = base.path().join("determinism_run_1");
    fs::create_dir_all(&run1).unwrap();
    write_report(&run1, r#"{"metrics":{"sharpe":2.0}}"#);

    let report = gateway
        .check_determinism(request(base.path().to_str().unwrap()), 42, 2)
        .await
        .unwrap();
    assert!(!report.ok);
    assert_eq!(report.diffs.len(), 1);
}

#[tokio::test]
async fn seed_is_forwarded_to_every_determinism_run() {
    let base = tempdir().unwrap();
    let runner = Arc::new(FakeContainerRunner::new());
    for _ in 0..2 {
        runner.push_response(Ok(execution(0)));
    }
    for i in 0..2 {
        fs::create_dir_all(base.path().join(format!("determinism_run_{i}"))).unwrap();
    }
    let gateway = SandboxGateway::new(runner.clone());

    gateway
        .check_determinism(request(base.path().to_str().unwrap()), 7, 2)
        .await
        .unwrap();

    let requests = runner.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.seed == Some(7)));
}
