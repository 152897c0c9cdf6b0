// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch payload a [`crate::worker::WorkerAdapter`] receives (spec §6
//! "Worker-role contract"). `Event::TaskDispatch` is the wire-level shape
//! the bus carries; this is the fuller context the scheduler assembles from
//! the task graph before handing a ready task to its role's adapter.

use tf_core::failure::FailureClass;
use tf_core::graph::{Task, WorkerRole};
use tf_core::workflow::{CorrelationId, WorkflowId};

/// Everything a role needs to act on one dispatched task.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub correlation_id: CorrelationId,
    pub workflow_id: WorkflowId,
    pub task: Task,
    pub attempt: u32,
    /// Set only when this task is a branch (spec §4.6 step 4).
    pub parent_description: Option<String>,
    pub failure_class: Option<FailureClass>,
    pub fix_hint: Option<String>,
    pub input_artifacts: Vec<String>,
    pub fixtures: Vec<String>,
}

impl DispatchRequest {
    pub fn role(&self) -> WorkerRole {
        self.task.role
    }
}
