// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

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
        failure_routing: HashMap::new(),
        metadata: HashMap::new(),
    }
}

fn graph(tasks: Vec<Task>) -> TaskGraph {
    TaskGraph {
        graph_id: GraphId::new("g1"),
        name: "test-graph".to_string(),
        created_at_ms: 0,
        tasks,
    }
}

#[test]
fn empty_graph_is_valid() {
    let g = graph(vec![]);
    assert!(g.validate().is_ok());
    assert!(g.topological_order().unwrap().is_empty());
}

#[test]
fn linear_chain_orders_by_dependency() {
    let g = graph(vec![
        task("C", &["B"]),
        task("A", &[]),
        task("B", &["A"]),
    ]);
    assert!(g.validate().is_ok());
    let order: Vec<String> = g
        .topological_order()
        .unwrap()
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();
    assert_eq!(order, vec!["A", "B", "C"]);
}

#[test]
fn missing_dependency_rejected() {
    let g = graph(vec![task("A", &["ghost"])]);
    let err = g.validate().unwrap_err();
    assert!(matches!(err, GraphValidationError::UnknownDependency { .. }));
}

#[test]
fn duplicate_task_id_rejected() {
    let g = graph(vec![task("A", &[]), task("A", &[])]);
    let err = g.validate().unwrap_err();
    assert!(matches!(err, GraphValidationError::DuplicateTaskId(_)));
}

#[test]
fn cycle_rejected() {
    let mut a = task("A", &["B"]);
    let b = task("B", &["A"]);
    a.deps = vec![TaskId::new("B")];
    let g = graph(vec![a, b]);
    let err = g.validate().unwrap_err();
    assert!(matches!(err, GraphValidationError::Cycle(_)));
}

#[test]
fn empty_acceptance_cmd_rejected() {
    let mut t = task("A", &[]);
    t.acceptance.push(AcceptanceCheck {
        cmd: "  ".to_string(),
        timeout: Duration::from_secs(1),
        expected_artifacts: vec![],
    });
    let g = graph(vec![t]);
    let err = g.validate().unwrap_err();
    assert!(matches!(err, GraphValidationError::MalformedAcceptance { .. }));
}

#[test]
fn ties_within_rank_break_by_priority_then_id() {
    let mut b = task("B", &[]);
    b.priority = 5;
    let mut a = task("A", &[]);
    a.priority = 1;
    let mut c = task("C", &[]);
    c.priority = 1;
    let g = graph(vec![b, a, c]);
    let order: Vec<String> = g
        .topological_order()
        .unwrap()
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();
    assert_eq!(order, vec!["A", "C", "B"]);
}

#[test]
fn older_graphs_without_branch_fields_default_sanely() {
    let json = serde_json::json!({
        "id": "A",
        "title": "A",
        "role": "implement",
        "deps": []
    });
    let t: Task = serde_json::from_value(json).unwrap();
    assert_eq!(t.debug_depth, 0);
    assert!(t.parent_id.is_none());
    assert!(!t.is_branch());
}
