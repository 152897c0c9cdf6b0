// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workflow mutable task bookkeeping the scheduler keeps alongside
//! [`tf_storage::MaterializedState`] (spec §3 `TaskGraph`: "immutable once
//! created" — branch tasks are synthesized at runtime, spec §4.6 step 4, so
//! they live here rather than on the original graph).

use std::collections::HashMap;
use tf_core::graph::{Task, TaskId};

/// The mutable task set for one workflow run: the original graph's tasks
/// plus any branch tasks synthesized so far, and the "current tip" of each
/// root task's branch chain used to track `debug_depth` across recursive
/// branching (spec §4.6 step 5 "recurse (next branch) up to depth limit").
#[derive(Debug, Default)]
pub struct WorkflowRuntime {
    pub tasks: HashMap<String, Task>,
    /// root task id -> id of the most recently synthesized branch in its
    /// chain (or the root itself, if no branch has been synthesized yet).
    pub branch_tips: HashMap<String, String>,
}

impl WorkflowRuntime {
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: tasks
                .into_iter()
                .map(|t| (t.id.as_str().to_string(), t))
                .collect(),
            branch_tips: HashMap::new(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn insert_branch(&mut self, task: Task) {
        let branch_id = task.id.as_str().to_string();
        // `root_of` walks `parent_id` links through `self.tasks`, so the
        // branch must already be present (pointing at its existing parent)
        // before the walk can reach past it.
        self.tasks.insert(branch_id.clone(), task);
        let root = self.root_of(&branch_id);
        self.branch_tips.insert(root, branch_id);
    }

    /// Walk `parent_id` links up to the original (non-branch) ancestor.
    pub fn root_of(&self, task_id: &str) -> String {
        let mut current = task_id.to_string();
        while let Some(task) = self.tasks.get(&current) {
            match &task.parent_id {
                Some(parent) => current = parent.as_str().to_string(),
                None => break,
            }
        }
        current
    }

    /// The current chain tip for `root`'s branch lineage: the most recent
    /// branch synthesized off it, or `root` itself if none yet.
    pub fn tip_of(&self, root: &str) -> String {
        self.branch_tips
            .get(root)
            .cloned()
            .unwrap_or_else(|| root.to_string())
    }

    /// Direct dependents of `task_id` within the original graph (branch
    /// tasks never appear as a `deps` target, so this only needs to look at
    /// non-branch tasks).
    pub fn dependents_of(&self, task_id: &str) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.deps.iter().any(|d| d.as_str() == task_id))
            .map(|t| t.id.clone())
            .collect()
    }

    /// All transitive dependents of `task_id`, breadth-first.
    pub fn transitive_dependents_of(&self, task_id: &str) -> Vec<TaskId> {
        let mut seen = Vec::new();
        let mut queue = self.dependents_of(task_id);
        while let Some(next) = queue.pop() {
            if seen.iter().any(|t: &TaskId| t.as_str() == next.as_str()) {
                continue;
            }
            queue.extend(self.dependents_of(next.as_str()));
            seen.push(next);
        }
        seen
    }
}

#[cfg(test)]
#[path = "runtime_state_tests.rs"]
mod tests;
