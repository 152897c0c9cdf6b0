// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tf_core::graph::WorkerRole;

fn task(id: &str, deps: &[&str]) -> Task {
    Task {
        id: TaskId::new(id),
        title: id.to_string(),
        description: String::new(),
        role: WorkerRole::Implement,
        priority: 0,
        deps: deps.iter().map(|d| TaskId::new(*d)).collect(),
        acceptance: Vec::new(),
        max_retries: 1,
        timeout: Duration::from_secs(60),
        parent_id: None,
        branch_reason: None,
        debug_depth: 0,
        failure_routing: Default::default(),
        metadata: Default::default(),
    }
}

fn branch(id: &str, parent: &str, depth: u32) -> Task {
    let mut t = task(id, &[]);
    t.parent_id = Some(TaskId::new(parent));
    t.debug_depth = depth;
    t
}

#[test]
fn root_of_follows_branch_chain() {
    let mut runtime = WorkflowRuntime::new([task("a", &[])]);
    runtime.insert_branch(branch("a_branch_1", "a", 1));
    runtime.insert_branch(branch("a_branch_1_branch_1", "a_branch_1", 2));

    assert_eq!(runtime.root_of("a_branch_1_branch_1"), "a");
    assert_eq!(runtime.tip_of("a"), "a_branch_1_branch_1");
}

#[test]
fn tip_defaults_to_root_before_any_branch() {
    let runtime = WorkflowRuntime::new([task("a", &[])]);
    assert_eq!(runtime.tip_of("a"), "a");
}

#[test]
fn transitive_dependents_covers_whole_downstream_chain() {
    let runtime = WorkflowRuntime::new([
        task("a", &[]),
        task("b", &["a"]),
        task("c", &["b"]),
        task("d", &[]),
    ]);

    let mut dependents: Vec<String> = runtime
        .transitive_dependents_of("a")
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
    dependents.sort();
    assert_eq!(dependents, vec!["b".to_string(), "c".to_string()]);
}
