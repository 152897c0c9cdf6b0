// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task graph: the immutable input to the scheduler (spec §3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

crate::define_id! {
    /// Identifier for a task graph.
    #[derive(Default)]
    pub struct GraphId;
}

crate::define_id! {
    /// Identifier for a task within a graph. Unique within the graph, not
    /// globally — branch tasks derive theirs from the parent's id.
    #[derive(Default)]
    pub struct TaskId;
}

/// Fixed set of worker-role tags a task can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    Design,
    Implement,
    Validate,
    Repair,
}

impl std::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerRole::Design => write!(f, "design"),
            WorkerRole::Implement => write!(f, "implement"),
            WorkerRole::Validate => write!(f, "validate"),
            WorkerRole::Repair => write!(f, "repair"),
        }
    }
}

/// Why a branch task was synthesized. Present only on branch tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchReason {
    ImplementationBug,
    SpecMismatch,
    Timeout,
    MissingDependency,
    FlakyTest,
    Unknown,
}

impl From<crate::failure::FailureClass> for BranchReason {
    fn from(class: crate::failure::FailureClass) -> Self {
        use crate::failure::FailureClass as F;
        match class {
            F::ImplementationBug => BranchReason::ImplementationBug,
            F::SpecMismatch => BranchReason::SpecMismatch,
            F::Timeout => BranchReason::Timeout,
            F::MissingDependency => BranchReason::MissingDependency,
            F::FlakyTest => BranchReason::FlakyTest,
            F::Unknown => BranchReason::Unknown,
        }
    }
}

/// A single acceptance test command a task's work must pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCheck {
    pub cmd: String,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    #[serde(default)]
    pub expected_artifacts: Vec<String>,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// How a failure class maps to a routed worker role, overriding the
/// scheduler default for this specific task (spec §4.6 step 3).
pub type FailureRouting = HashMap<BranchReason, WorkerRole>;

/// A unit of work in a task graph (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub role: WorkerRole,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub deps: Vec<TaskId>,
    #[serde(default)]
    pub acceptance: Vec<AcceptanceCheck>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_task_timeout", with = "duration_secs")]
    pub timeout: Duration,
    /// Present only on branch tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    /// Present only on branch tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_reason: Option<BranchReason>,
    /// 0 for all non-branch tasks.
    #[serde(default)]
    pub debug_depth: u32,
    /// class -> role override for this task's branch routing.
    #[serde(default)]
    pub failure_routing: FailureRouting,
    /// Opaque metadata (fixture paths, etc).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_max_retries() -> u32 {
    1
}

fn default_task_timeout() -> Duration {
    Duration::from_secs(600)
}

impl Task {
    /// A task synthesized as `true` only on branch tasks created by the
    /// scheduler in response to a failure (spec §4.6 step 4).
    pub fn is_branch(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Errors that can arise validating a [`TaskGraph`] at admission time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphValidationError {
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),
    #[error("task {task} depends on unknown task {dep}")]
    UnknownDependency { task: String, dep: String },
    #[error("dependency cycle detected involving task {0}")]
    Cycle(String),
    #[error("task {task} has a malformed acceptance check: {reason}")]
    MalformedAcceptance { task: String, reason: String },
}

/// A directed acyclic graph of tasks (spec §3). Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGraph {
    pub graph_id: GraphId,
    pub name: String,
    #[serde(default)]
    pub created_at_ms: u64,
    pub tasks: Vec<Task>,
}

impl TaskGraph {
    /// Validate structural invariants (spec §3 and §6): unique ids, every
    /// dependency resolves, acceptance checks are well-formed, and the
    /// dependency edges form a DAG.
    pub fn validate(&self) -> Result<(), GraphValidationError> {
        let mut seen = std::collections::HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(GraphValidationError::DuplicateTaskId(
                    task.id.as_str().to_string(),
                ));
            }
        }

        let ids: std::collections::HashSet<&str> =
            self.tasks.iter().map(|t| t.id.as_str()).collect();
        for task in &self.tasks {
            for dep in &task.deps {
                if !ids.contains(dep.as_str()) {
                    return Err(GraphValidationError::UnknownDependency {
                        task: task.id.as_str().to_string(),
                        dep: dep.as_str().to_string(),
                    });
                }
            }
            for acceptance in &task.acceptance {
                if acceptance.cmd.trim().is_empty() {
                    return Err(GraphValidationError::MalformedAcceptance {
                        task: task.id.as_str().to_string(),
                        reason: "cmd must not be empty".to_string(),
                    });
                }
            }
        }

        self.topological_order()?;
        Ok(())
    }

    /// Return task ids in topological rank order (dependencies before
    /// dependents), ties within a rank broken by `priority` then task id.
    /// Errs if the graph contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<TaskId>, GraphValidationError> {
        let by_id: HashMap<&str, &Task> = self.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut in_degree: HashMap<&str, usize> = self
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.deps.len()))
            .collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for task in &self.tasks {
            for dep in &task.deps {
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(task.id.as_str());
            }
        }

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());

        while !ready.is_empty() {
            ready.sort_by(|a, b| {
                let ta = by_id[a];
                let tb = by_id[b];
                ta.priority.cmp(&tb.priority).then_with(|| a.cmp(b))
            });
            let next = ready.remove(0);
            order.push(TaskId::new(next));

            if let Some(deps) = dependents.get(next) {
                for &dependent in deps {
                    if let Some(deg) = in_degree.get_mut(dependent) {
                        *deg -= 1;
                        if *deg == 0 {
                            ready.push(dependent);
                        }
                    }
                }
            }
        }

        if order.len() != self.tasks.len() {
            let stuck = self
                .tasks
                .iter()
                .find(|t| !order.iter().any(|o| o.as_str() == t.id.as_str()))
                .map(|t| t.id.as_str().to_string())
                .unwrap_or_default();
            return Err(GraphValidationError::Cycle(stuck));
        }

        Ok(order)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id.as_str() == id)
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
