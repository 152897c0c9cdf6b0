// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state rebuilt from WAL replay.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tf_core::{CorrelationId, Event, GraphId, TaskStatus, Workflow, WorkflowId, WorkflowStatus};

/// Materialized state built from event-sourced replay.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub workflows: HashMap<String, Workflow>,
    /// Per-key cooldown expiry, durable across restart so the router
    /// doesn't re-admit a key whose provider just rejected it for abuse
    /// (spec §4.2, §4.3).
    #[serde(default)]
    pub credential_cooldowns: HashMap<String, u64>,
}

impl MaterializedState {
    /// Get a workflow by id or unique prefix (like git commit hashes).
    pub fn get_workflow(&self, id: &str) -> Option<&Workflow> {
        if let Some(workflow) = self.workflows.get(id) {
            return Some(workflow);
        }
        let matches: Vec<_> = self
            .workflows
            .iter()
            .filter(|(k, _)| k.starts_with(id))
            .collect();
        if matches.len() == 1 {
            Some(matches[0].1)
        } else {
            None
        }
    }

    /// Cooldown expiry recorded for `key_id`, if any.
    pub fn cooldown_until(&self, key_id: &str) -> Option<u64> {
        self.credential_cooldowns.get(key_id).copied()
    }

    /// Entry for a workflow, inserting a bare placeholder if this is the
    /// first event this replay pass has seen for it. Only `workflow:created`
    /// is expected to originate the entry in practice — the placeholder path
    /// exists so replay starting mid-stream (after a snapshot whose own
    /// `workflow:created` entry already scrolled out of the WAL) still
    /// converges instead of dropping later events on the floor.
    fn workflow_entry(&mut self, workflow_id: &WorkflowId) -> &mut Workflow {
        self.workflows
            .entry(workflow_id.as_str().to_string())
            .or_insert_with(|| {
                Workflow::new(
                    workflow_id.clone(),
                    GraphId::new(""),
                    CorrelationId::default(),
                    0,
                    std::iter::empty(),
                )
            })
    }

    /// Apply an event to derive state changes.
    ///
    /// This is the event-sourcing approach where state is derived from
    /// events: events are facts about what happened, state is derived from
    /// those facts.
    ///
    /// # Idempotency requirement
    ///
    /// All handlers here must be idempotent — applying the same event twice
    /// must produce the same state as applying it once, since an event may
    /// be applied once for immediate in-process visibility and again when
    /// the WAL is replayed after a restart. Handlers favor assignment over
    /// accumulation and guard counters with status checks rather than
    /// unconditionally incrementing them.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::WorkflowCreated {
                workflow_id,
                graph_id,
            } => {
                let workflow = self.workflow_entry(workflow_id);
                workflow.graph_id = graph_id.clone();
                workflow.status = WorkflowStatus::Created;
            }

            Event::WorkflowRunning { workflow_id } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id.as_str()) {
                    workflow.status = WorkflowStatus::Running;
                }
            }

            Event::WorkflowCompleted { workflow_id } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id.as_str()) {
                    workflow.status = WorkflowStatus::Completed;
                }
            }

            Event::WorkflowFailed { workflow_id } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id.as_str()) {
                    workflow.status = WorkflowStatus::Failed;
                }
            }

            Event::WorkflowCancelled { workflow_id } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id.as_str()) {
                    workflow.status = WorkflowStatus::Cancelled;
                }
            }

            Event::TaskDispatch {
                workflow_id,
                task_id,
                attempt,
                ..
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                task.status = TaskStatus::Dispatched;
                task.attempts = *attempt;
            }

            Event::TaskCompleted {
                workflow_id,
                task_id,
                artifacts,
                ..
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                task.status = TaskStatus::Completed;
                task.last_error = None;
                task.produced_artifacts = artifacts.iter().map(|a| a.path.clone()).collect();
            }

            Event::TaskFailed {
                workflow_id,
                task_id,
                failures,
                ..
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                task.status = TaskStatus::Failed;
                task.last_error = failures.last().cloned();
                task.last_failures.clone_from(failures);
            }

            Event::TestFailed {
                workflow_id,
                task_id,
                failures,
                ..
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                task.last_failures.clone_from(failures);
            }

            // Acceptance passing is reported alongside task:completed; the
            // report path itself isn't part of persisted runtime state.
            Event::TestPassed { .. } => {}

            Event::TaskBranched {
                workflow_id,
                branch_task_id,
                ..
            } => {
                let workflow = self.workflow_entry(workflow_id);
                // The branch id was already assigned deterministically by
                // the scheduler via `Workflow::next_branch_id` before this
                // event was emitted; replay only needs to make sure the
                // task entry exists.
                workflow
                    .task_states
                    .entry(branch_task_id.as_str().to_string())
                    .or_default();
            }

            Event::TaskEscalated {
                workflow_id,
                task_id,
                reason,
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                task.status = TaskStatus::Blocked;
                task.last_error = Some(reason.clone());
            }

            Event::ApprovalRequested {
                workflow_id,
                task_id,
                ..
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                task.status = TaskStatus::Blocked;
            }

            Event::ArtifactCommitted {
                workflow_id,
                task_id,
                revision_id,
                ..
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                if !task.produced_artifacts.contains(revision_id) {
                    task.produced_artifacts.push(revision_id.clone());
                }
            }

            Event::ArtifactCommitRejected {
                workflow_id,
                task_id,
                reason,
            } => {
                let workflow = self.workflow_entry(workflow_id);
                let task = workflow
                    .task_states
                    .entry(task_id.as_str().to_string())
                    .or_default();
                task.last_error = Some(reason.clone());
            }

            Event::CredentialCooldown {
                key_id,
                until_epoch_ms,
                ..
            } => {
                let entry = self
                    .credential_cooldowns
                    .entry(key_id.as_str().to_string())
                    .or_insert(0);
                *entry = (*entry).max(*until_epoch_ms);
            }

            // Dispatch-adjacent events that don't change persisted state.
            Event::DebuggerAttach { .. }
            | Event::CredentialRequestDenied { .. }
            | Event::Custom => {}
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
