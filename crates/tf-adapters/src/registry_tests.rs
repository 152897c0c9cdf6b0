// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::worker::FakeWorkerAdapter;
use tf_core::graph::{Task, WorkerRole};
use tf_core::workflow::{CorrelationId, WorkflowId};

fn task(role: WorkerRole) -> Task {
    Task {
        id: "t1".into(),
        title: "do it".to_string(),
        description: String::new(),
        role,
        priority: 0,
        deps: Vec::new(),
        acceptance: Vec::new(),
        max_retries: 1,
        timeout: std::time::Duration::from_secs(600),
        parent_id: None,
        branch_reason: None,
        debug_depth: 0,
        failure_routing: Default::default(),
        metadata: Default::default(),
    }
}

fn request(role: WorkerRole) -> DispatchRequest {
    DispatchRequest {
        correlation_id: CorrelationId::new("corr-1"),
        workflow_id: WorkflowId::new("wf-1"),
        task: task(role),
        attempt: 1,
        parent_description: None,
        failure_class: None,
        fix_hint: None,
        input_artifacts: Vec::new(),
        fixtures: Vec::new(),
    }
}

#[tokio::test]
async fn dispatches_to_the_registered_role_adapter() {
    let implement = Arc::new(FakeWorkerAdapter::new());
    implement.push_response(Ok(Event::TaskCompleted {
        workflow_id: WorkflowId::new("wf-1"),
        task_id: "t1".into(),
        attempt: 1,
        artifacts: Vec::new(),
        metrics: None,
    }));

    let mut registry = RoleRegistry::new();
    registry.register(WorkerRole::Implement, implement.clone());

    let result = registry
        .dispatch(request(WorkerRole::Implement))
        .await
        .unwrap();
    assert!(matches!(result, Event::TaskCompleted { .. }));
    assert_eq!(implement.requests().len(), 1);
}

#[tokio::test]
async fn unregistered_role_errors() {
    let registry = RoleRegistry::new();
    let err = registry
        .dispatch(request(WorkerRole::Validate))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::RoleNotRegistered(WorkerRole::Validate)));
}
