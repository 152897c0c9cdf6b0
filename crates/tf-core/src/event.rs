// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event envelope and payload taxonomy shared across the bus, scheduler,
//! router, and artifact store (spec §3, §4.1).

use crate::credential::KeyId;
use crate::failure::FailureClass;
use crate::graph::{GraphId, TaskId, WorkerRole};
use crate::workflow::{CorrelationId, WorkflowId};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a single emitted event.
    #[derive(Default)]
    pub struct EventId;
}

/// Fixed set of named channels the bus routes events over (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Requests,
    Results,
    WorkflowLifecycle,
    TestOutcomes,
    DebuggerRequests,
    ArtifactEvents,
    Approvals,
    Audit,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::Requests,
        Channel::Results,
        Channel::WorkflowLifecycle,
        Channel::TestOutcomes,
        Channel::DebuggerRequests,
        Channel::ArtifactEvents,
        Channel::Approvals,
        Channel::Audit,
    ];
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Channel::Requests => "requests",
            Channel::Results => "results",
            Channel::WorkflowLifecycle => "workflow_lifecycle",
            Channel::TestOutcomes => "test_outcomes",
            Channel::DebuggerRequests => "debugger_requests",
            Channel::ArtifactEvents => "artifact_events",
            Channel::Approvals => "approvals",
            Channel::Audit => "audit",
        };
        write!(f, "{s}")
    }
}

/// A single produced artifact handle (path only, no contents — spec §4.5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub path: String,
}

/// Performance/test metrics attached to a successful completion, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    #[serde(default)]
    pub duration_s: f64,
    #[serde(default)]
    pub tests_passed: u32,
    #[serde(default)]
    pub tests_failed: u32,
}

/// Event payloads. Serializes with `{"type": "namespace:event", ...fields}`
/// format. Unknown type tags deserialize to `Custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- dispatch (requests channel) --
    #[serde(rename = "task:dispatch")]
    TaskDispatch {
        workflow_id: WorkflowId,
        task_id: TaskId,
        role: WorkerRole,
        attempt: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_task_id: Option<TaskId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure_class: Option<FailureClass>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fix_hint: Option<String>,
    },

    // -- results channel --
    #[serde(rename = "task:completed")]
    TaskCompleted {
        workflow_id: WorkflowId,
        task_id: TaskId,
        attempt: u32,
        #[serde(default)]
        artifacts: Vec<ArtifactRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metrics: Option<TaskMetrics>,
    },

    #[serde(rename = "task:failed")]
    TaskFailed {
        workflow_id: WorkflowId,
        task_id: TaskId,
        attempt: u32,
        #[serde(default)]
        failures: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        logs_path: Option<String>,
    },

    // -- test outcomes channel (validator role) --
    #[serde(rename = "test:passed")]
    TestPassed {
        workflow_id: WorkflowId,
        task_id: TaskId,
        report_path: String,
    },

    #[serde(rename = "test:failed")]
    TestFailed {
        workflow_id: WorkflowId,
        task_id: TaskId,
        report_path: String,
        #[serde(default)]
        failures: Vec<String>,
    },

    // -- workflow lifecycle channel --
    #[serde(rename = "workflow:created")]
    WorkflowCreated {
        workflow_id: WorkflowId,
        graph_id: GraphId,
    },

    #[serde(rename = "workflow:running")]
    WorkflowRunning { workflow_id: WorkflowId },

    #[serde(rename = "workflow:completed")]
    WorkflowCompleted { workflow_id: WorkflowId },

    #[serde(rename = "workflow:failed")]
    WorkflowFailed { workflow_id: WorkflowId },

    #[serde(rename = "workflow:cancelled")]
    WorkflowCancelled { workflow_id: WorkflowId },

    #[serde(rename = "task:branched")]
    TaskBranched {
        workflow_id: WorkflowId,
        parent_task_id: TaskId,
        branch_task_id: TaskId,
        reason: FailureClass,
        debug_depth: u32,
    },

    #[serde(rename = "task:escalated")]
    TaskEscalated {
        workflow_id: WorkflowId,
        task_id: TaskId,
        reason: String,
    },

    // -- debugger requests channel --
    #[serde(rename = "debugger:attach")]
    DebuggerAttach {
        workflow_id: WorkflowId,
        task_id: TaskId,
    },

    // -- artifact events channel --
    #[serde(rename = "artifact:committed")]
    ArtifactCommitted {
        workflow_id: WorkflowId,
        task_id: TaskId,
        correlation_id: CorrelationId,
        branch: String,
        revision_id: String,
        pushed: bool,
    },

    #[serde(rename = "artifact:commit_rejected")]
    ArtifactCommitRejected {
        workflow_id: WorkflowId,
        task_id: TaskId,
        reason: String,
    },

    // -- approvals channel --
    #[serde(rename = "approval:requested")]
    ApprovalRequested {
        workflow_id: WorkflowId,
        task_id: TaskId,
        reason: String,
    },

    // -- audit channel --
    #[serde(rename = "credential:cooldown")]
    CredentialCooldown {
        key_id: KeyId,
        until_epoch_ms: u64,
        reason: String,
    },

    #[serde(rename = "credential:request_denied")]
    CredentialRequestDenied {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_id: Option<KeyId>,
        reason: String,
    },

    /// Catch-all for unknown event types (extensibility).
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::TaskDispatch { .. } => "task:dispatch",
            Event::TaskCompleted { .. } => "task:completed",
            Event::TaskFailed { .. } => "task:failed",
            Event::TestPassed { .. } => "test:passed",
            Event::TestFailed { .. } => "test:failed",
            Event::WorkflowCreated { .. } => "workflow:created",
            Event::WorkflowRunning { .. } => "workflow:running",
            Event::WorkflowCompleted { .. } => "workflow:completed",
            Event::WorkflowFailed { .. } => "workflow:failed",
            Event::WorkflowCancelled { .. } => "workflow:cancelled",
            Event::TaskBranched { .. } => "task:branched",
            Event::TaskEscalated { .. } => "task:escalated",
            Event::DebuggerAttach { .. } => "debugger:attach",
            Event::ArtifactCommitted { .. } => "artifact:committed",
            Event::ArtifactCommitRejected { .. } => "artifact:commit_rejected",
            Event::ApprovalRequested { .. } => "approval:requested",
            Event::CredentialCooldown { .. } => "credential:cooldown",
            Event::CredentialRequestDenied { .. } => "credential:request_denied",
            Event::Custom => "custom",
        }
    }

    /// Channel this event type is published on. Used to validate that a
    /// publisher is not accidentally writing to the wrong topic.
    pub fn channel(&self) -> Channel {
        match self {
            Event::TaskDispatch { .. } | Event::DebuggerAttach { .. } => Channel::Requests,
            Event::TaskCompleted { .. } | Event::TaskFailed { .. } => Channel::Results,
            Event::TestPassed { .. } | Event::TestFailed { .. } => Channel::TestOutcomes,
            Event::WorkflowCreated { .. }
            | Event::WorkflowRunning { .. }
            | Event::WorkflowCompleted { .. }
            | Event::WorkflowFailed { .. }
            | Event::WorkflowCancelled { .. }
            | Event::TaskBranched { .. }
            | Event::TaskEscalated { .. } => Channel::WorkflowLifecycle,
            Event::ArtifactCommitted { .. } | Event::ArtifactCommitRejected { .. } => {
                Channel::ArtifactEvents
            }
            Event::ApprovalRequested { .. } => Channel::Approvals,
            Event::CredentialCooldown { .. } | Event::CredentialRequestDenied { .. } => {
                Channel::Audit
            }
            Event::Custom => Channel::Audit,
        }
    }

    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        match self {
            Event::TaskDispatch { workflow_id, .. }
            | Event::TaskCompleted { workflow_id, .. }
            | Event::TaskFailed { workflow_id, .. }
            | Event::TestPassed { workflow_id, .. }
            | Event::TestFailed { workflow_id, .. }
            | Event::WorkflowCreated { workflow_id, .. }
            | Event::WorkflowRunning { workflow_id }
            | Event::WorkflowCompleted { workflow_id }
            | Event::WorkflowFailed { workflow_id }
            | Event::WorkflowCancelled { workflow_id }
            | Event::TaskBranched { workflow_id, .. }
            | Event::TaskEscalated { workflow_id, .. }
            | Event::DebuggerAttach { workflow_id, .. }
            | Event::ArtifactCommitted { workflow_id, .. }
            | Event::ArtifactCommitRejected { workflow_id, .. }
            | Event::ApprovalRequested { workflow_id, .. } => Some(workflow_id),
            Event::CredentialCooldown { .. }
            | Event::CredentialRequestDenied { .. }
            | Event::Custom => None,
        }
    }
}

/// The envelope every event travels in on the bus (spec §3 `Event`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event_id: EventId,
    pub correlation_id: CorrelationId,
    pub source: String,
    pub timestamp_ms: u64,
    pub payload: Event,
}

impl Envelope {
    pub fn new(
        event_id: EventId,
        correlation_id: CorrelationId,
        source: impl Into<String>,
        timestamp_ms: u64,
        payload: Event,
    ) -> Self {
        Self {
            event_id,
            correlation_id,
            source: source.into(),
            timestamp_ms,
            payload,
        }
    }

    pub fn channel(&self) -> Channel {
        self.payload.channel()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
