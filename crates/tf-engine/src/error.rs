// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the workflow scheduler.

use tf_adapters::AdapterError;
use tf_artifact::ArtifactError;
use tf_bus::BusError;
use tf_core::graph::GraphValidationError;
use tf_storage::StateStoreError;
use thiserror::Error;

/// Errors that can occur driving a workflow through the scheduler.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid task graph: {0}")]
    Graph(#[from] GraphValidationError),
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("no worker adapter for this role: {0}")]
    Adapter(#[from] AdapterError),
    #[error("artifact store error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("state store error: {0}")]
    Storage(#[from] StateStoreError),
    #[error("event bus error: {0}")]
    Bus(#[from] BusError),
    #[error("branch depth exceeded for task {task_id} at depth {depth}")]
    BranchDepthExceeded { task_id: String, depth: u32 },
    #[error("workflow {0} is cancelled")]
    Cancelled(String),
    #[error("dispatch task join error: {0}")]
    Join(String),
}
