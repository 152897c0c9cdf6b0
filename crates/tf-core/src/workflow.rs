// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow: the mutable runtime instance produced from a [`crate::TaskGraph`]
//! (spec §3, owned exclusively by the scheduler's executor).

use crate::graph::{GraphId, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Identifier for a workflow run.
    #[derive(Default)]
    pub struct WorkflowId;
}

crate::define_id! {
    /// Process-wide trace identifier stamped on every event produced while
    /// handling a single originating request.
    #[derive(Default)]
    pub struct CorrelationId;
}

/// Overall workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Created,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::Created => "created",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Per-task lifecycle status (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Ready,
    Dispatched,
    Running,
    Completed,
    Failed,
    Retrying,
    Blocked,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::Dispatched => "dispatched",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Retrying => "retrying",
            TaskStatus::Blocked => "blocked",
        };
        write!(f, "{s}")
    }
}

/// Mutable per-task runtime state (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    pub status: TaskStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Structured sandbox failures, if the last attempt ran acceptance tests.
    #[serde(default)]
    pub last_failures: Vec<String>,
    #[serde(default)]
    pub produced_artifacts: Vec<String>,
}

impl Default for TaskState {
    fn default() -> Self {
        Self {
            status: TaskStatus::Pending,
            attempts: 0,
            started_at_ms: None,
            finished_at_ms: None,
            last_error: None,
            last_failures: Vec::new(),
            produced_artifacts: Vec::new(),
        }
    }
}

/// A runtime instance produced from a task graph (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub workflow_id: WorkflowId,
    pub graph_id: GraphId,
    pub correlation_id: CorrelationId,
    pub created_at_ms: u64,
    pub status: WorkflowStatus,
    pub task_states: HashMap<String, TaskState>,
    /// Per-parent counter used to name branches deterministically
    /// (spec §9 "Branch-task stability").
    #[serde(default)]
    pub branch_counters: HashMap<String, u32>,
}

impl Workflow {
    pub fn new(
        workflow_id: WorkflowId,
        graph_id: GraphId,
        correlation_id: CorrelationId,
        created_at_ms: u64,
        task_ids: impl IntoIterator<Item = TaskId>,
    ) -> Self {
        let task_states = task_ids
            .into_iter()
            .map(|id| (id.as_str().to_string(), TaskState::default()))
            .collect();
        Self {
            workflow_id,
            graph_id,
            correlation_id,
            created_at_ms,
            status: WorkflowStatus::Created,
            task_states,
            branch_counters: HashMap::new(),
        }
    }

    /// Next deterministic branch id for `parent_id` (spec §4.6 step 4,
    /// §9 "Branch-task stability": incrementing counter, not a random
    /// suffix, so replays and tests are stable).
    pub fn next_branch_id(&mut self, parent_id: &str) -> String {
        let counter = self.branch_counters.entry(parent_id.to_string()).or_insert(0);
        *counter += 1;
        format!("{parent_id}_branch_{counter}")
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }

    pub fn task_state(&self, task_id: &str) -> Option<&TaskState> {
        self.task_states.get(task_id)
    }

    pub fn task_state_mut(&mut self, task_id: &str) -> Option<&mut TaskState> {
        self.task_states.get_mut(task_id)
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
