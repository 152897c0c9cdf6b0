// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn dispatch_serializes_with_tagged_type() {
    let event = Event::TaskDispatch {
        workflow_id: WorkflowId::new("w1"),
        task_id: TaskId::new("t1"),
        role: WorkerRole::Implement,
        attempt: 1,
        parent_task_id: None,
        failure_class: None,
        fix_hint: None,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "task:dispatch");
    assert_eq!(json["role"], "implement");
    assert!(json.get("parent_task_id").is_none());
}

#[test]
fn unknown_type_tag_deserializes_to_custom() {
    let json = serde_json::json!({"type": "something:unheard_of", "foo": "bar"});
    let event: Event = serde_json::from_value(json).unwrap();
    assert_eq!(event, Event::Custom);
}

#[test]
fn channel_routing_matches_spec_taxonomy() {
    let dispatch = Event::TaskDispatch {
        workflow_id: WorkflowId::new("w1"),
        task_id: TaskId::new("t1"),
        role: WorkerRole::Implement,
        attempt: 1,
        parent_task_id: None,
        failure_class: None,
        fix_hint: None,
    };
    assert_eq!(dispatch.channel(), Channel::Requests);

    let completed = Event::TaskCompleted {
        workflow_id: WorkflowId::new("w1"),
        task_id: TaskId::new("t1"),
        attempt: 1,
        artifacts: vec![],
        metrics: None,
    };
    assert_eq!(completed.channel(), Channel::Results);

    let branched = Event::TaskBranched {
        workflow_id: WorkflowId::new("w1"),
        parent_task_id: TaskId::new("t1"),
        branch_task_id: TaskId::new("t1_branch_1"),
        reason: FailureClass::Timeout,
        debug_depth: 1,
    };
    assert_eq!(branched.channel(), Channel::WorkflowLifecycle);
}

#[test]
fn workflow_id_extraction_is_none_for_audit_events() {
    let event = Event::CredentialCooldown {
        key_id: KeyId::new("k1"),
        until_epoch_ms: 1_000,
        reason: "rate_limit".to_string(),
    };
    assert!(event.workflow_id().is_none());
}

#[test]
fn envelope_channel_delegates_to_payload() {
    let envelope = Envelope::new(
        EventId::new("e1"),
        CorrelationId::new("c1"),
        "scheduler",
        0,
        Event::WorkflowRunning {
            workflow_id: WorkflowId::new("w1"),
        },
    );
    assert_eq!(envelope.channel(), Channel::WorkflowLifecycle);
}

#[test]
fn channel_all_has_eight_entries() {
    assert_eq!(Channel::ALL.len(), 8);
}
