// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tf_core::{ArtifactRef, FailureClass, TaskId, WorkerRole};

fn wf() -> WorkflowId {
    WorkflowId::new("w1")
}

fn t() -> TaskId {
    TaskId::new("t1")
}

#[test]
fn workflow_created_seeds_an_entry_with_the_graph_id() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::WorkflowCreated {
        workflow_id: wf(),
        graph_id: GraphId::new("g1"),
    });

    let workflow = state.get_workflow("w1").unwrap();
    assert_eq!(workflow.graph_id.as_str(), "g1");
    assert_eq!(workflow.status, WorkflowStatus::Created);
}

#[test]
fn lifecycle_events_update_status() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::WorkflowCreated {
        workflow_id: wf(),
        graph_id: GraphId::new("g1"),
    });
    state.apply_event(&Event::WorkflowRunning {
        workflow_id: wf(),
    });
    assert_eq!(
        state.get_workflow("w1").unwrap().status,
        WorkflowStatus::Running
    );

    state.apply_event(&Event::WorkflowCompleted {
        workflow_id: wf(),
    });
    assert_eq!(
        state.get_workflow("w1").unwrap().status,
        WorkflowStatus::Completed
    );
}

#[test]
fn task_dispatch_sets_dispatched_status_and_attempt_count() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::TaskDispatch {
        workflow_id: wf(),
        task_id: t(),
        role: WorkerRole::Implement,
        attempt: 2,
        parent_task_id: None,
        failure_class: None,
        fix_hint: None,
    });

    let task = state.get_workflow("w1").unwrap().task_state("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Dispatched);
    assert_eq!(task.attempts, 2);
}

#[test]
fn task_completed_clears_prior_error_and_records_artifacts() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::TaskFailed {
        workflow_id: wf(),
        task_id: t(),
        attempt: 1,
        failures: vec!["boom".to_string()],
        logs_path: None,
    });
    state.apply_event(&Event::TaskCompleted {
        workflow_id: wf(),
        task_id: t(),
        attempt: 2,
        artifacts: vec![ArtifactRef {
            path: "src/lib.rs".to_string(),
        }],
        metrics: None,
    });

    let task = state.get_workflow("w1").unwrap().task_state("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.last_error.is_none());
    assert_eq!(task.produced_artifacts, vec!["src/lib.rs".to_string()]);
}

#[test]
fn task_failed_records_last_error_as_most_recent_failure() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::TaskFailed {
        workflow_id: wf(),
        task_id: t(),
        attempt: 1,
        failures: vec!["first".to_string(), "second".to_string()],
        logs_path: None,
    });

    let task = state.get_workflow("w1").unwrap().task_state("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.last_error.as_deref(), Some("second"));
}

#[test]
fn task_branched_creates_a_pending_entry_for_the_branch_task() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::TaskBranched {
        workflow_id: wf(),
        parent_task_id: t(),
        branch_task_id: TaskId::new("t1_branch_1"),
        reason: FailureClass::ImplementationBug,
        debug_depth: 1,
    });

    let task = state
        .get_workflow("w1")
        .unwrap()
        .task_state("t1_branch_1")
        .unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
}

#[test]
fn task_escalated_blocks_the_task_and_records_the_reason() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::TaskEscalated {
        workflow_id: wf(),
        task_id: t(),
        reason: "exhausted branch depth".to_string(),
    });

    let task = state.get_workflow("w1").unwrap().task_state("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Blocked);
    assert_eq!(task.last_error.as_deref(), Some("exhausted branch depth"));
}

#[test]
fn artifact_committed_appends_the_revision_id_without_duplicates() {
    let mut state = MaterializedState::default();
    let event = Event::ArtifactCommitted {
        workflow_id: wf(),
        task_id: t(),
        correlation_id: tf_core::CorrelationId::new("c1"),
        branch: "tf/w1/t1".to_string(),
        revision_id: "abc123".to_string(),
        pushed: false,
    };
    state.apply_event(&event);
    state.apply_event(&event);

    let task = state.get_workflow("w1").unwrap().task_state("t1").unwrap();
    assert_eq!(task.produced_artifacts, vec!["abc123".to_string()]);
}

#[test]
fn credential_cooldown_only_ever_extends_never_shortens() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::CredentialCooldown {
        key_id: tf_core::KeyId::new("k1"),
        until_epoch_ms: 10_000,
        reason: "rate_limited".to_string(),
    });
    state.apply_event(&Event::CredentialCooldown {
        key_id: tf_core::KeyId::new("k1"),
        until_epoch_ms: 5_000,
        reason: "rate_limited".to_string(),
    });

    assert_eq!(state.cooldown_until("k1"), Some(10_000));
}

#[test]
fn get_workflow_resolves_unambiguous_prefix() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::WorkflowCreated {
        workflow_id: WorkflowId::new("abcdef"),
        graph_id: GraphId::new("g1"),
    });

    assert!(state.get_workflow("abc").is_some());
}

#[test]
fn get_workflow_ambiguous_prefix_returns_none() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::WorkflowCreated {
        workflow_id: WorkflowId::new("abc111"),
        graph_id: GraphId::new("g1"),
    });
    state.apply_event(&Event::WorkflowCreated {
        workflow_id: WorkflowId::new("abc222"),
        graph_id: GraphId::new("g1"),
    });

    assert!(state.get_workflow("abc").is_none());
}

#[test]
fn applying_task_completed_twice_is_idempotent() {
    let mut state = MaterializedState::default();
    let event = Event::TaskCompleted {
        workflow_id: wf(),
        task_id: t(),
        attempt: 1,
        artifacts: vec![ArtifactRef {
            path: "a.rs".to_string(),
        }],
        metrics: None,
    };
    state.apply_event(&event);
    state.apply_event(&event);

    let task = state.get_workflow("w1").unwrap().task_state("t1").unwrap();
    assert_eq!(task.produced_artifacts, vec!["a.rs".to_string()]);
}
