// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tf_core::graph::{Task, WorkerRole};
use tf_core::workflow::{CorrelationId, WorkflowId};
use tf_sandbox::types::RawExecution;
use tf_sandbox::FakeContainerRunner;

fn task() -> Task {
    Task {
        id: "t1".into(),
        title: "validate it".to_string(),
        description: String::new(),
        role: WorkerRole::Validate,
        priority: 0,
        deps: Vec::new(),
        acceptance: Vec::new(),
        max_retries: 1,
        timeout: std::time::Duration::from_secs(30),
        parent_id: None,
        branch_reason: None,
        debug_depth: 0,
        failure_routing: Default::default(),
        metadata: Default::default(),
    }
}

fn request() -> DispatchRequest {
    DispatchRequest {
        correlation_id: CorrelationId::new("corr-1"),
        workflow_id: WorkflowId::new("wf-1"),
        task: task(),
        attempt: 1,
        parent_description: None,
        failure_class: None,
        fix_hint: None,
        input_artifacts: vec!["strategy.py".to_string(), "test_strategy.py".to_string()],
        fixtures: Vec::new(),
    }
}

fn execution(exit_code: i32) -> RawExecution {
    RawExecution {
        exit_code,
        duration_s: 0.1,
        stdout: Vec::new(),
        stderr: Vec::new(),
        timed_out: false,
    }
}

#[tokio::test]
async fn clean_exit_with_no_report_is_schema_invalid_test_failure() {
    let runner = FakeContainerRunner::new();
    runner.push_response(Ok(execution(0)));
    let adapter = SandboxWorkerAdapter::new(SandboxGateway::new(runner), "/tmp/tf-adapters-sw");

    let result = adapter.handle_dispatch(request()).await.unwrap();
    match result {
        Event::TestFailed { failures, .. } => {
            assert!(failures[0].contains("schema-invalid"));
        }
        other => panic!("expected TestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_scripted_response_is_folded_into_sandbox_error_test_failure() {
    let runner = FakeContainerRunner::new();
    let adapter = SandboxWorkerAdapter::new(SandboxGateway::new(runner), "/tmp/tf-adapters-sw");
    let result = adapter.handle_dispatch(request()).await.unwrap();
    match result {
        Event::TestFailed { failures, .. } => {
            assert!(failures[0].contains("sandbox-error"));
        }
        other => panic!("expected TestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn io_error_from_the_runner_propagates_as_an_upstream_error() {
    let runner = FakeContainerRunner::new();
    runner.push_response(Err(tf_sandbox::SandboxError::Io(std::io::Error::other(
        "spawn failed",
    ))));
    let adapter = SandboxWorkerAdapter::new(SandboxGateway::new(runner), "/tmp/tf-adapters-sw");
    let err = adapter.handle_dispatch(request()).await.unwrap_err();
    assert!(matches!(err, AdapterError::Upstream(_)));
}
