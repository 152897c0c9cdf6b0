// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pluggable workflow-state store (spec §4.6 "Persistence"):
//! `save_workflow`/`load_workflow`/`list_workflows`, with an in-process
//! default and a filesystem-backed implementation for cross-restart
//! durability. The scheduler tolerates restart iff the durable variant is
//! configured.

use crate::checkpoint::{CheckpointError, CheckpointWriter, FsCheckpointWriter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use tf_core::Workflow;
use thiserror::Error;

/// Errors saving or loading workflow state.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Pluggable workflow-state store (spec §4.6). Implemented by both an
/// in-process map and a filesystem-backed store so the scheduler can be
/// configured either way without changing its own code.
pub trait WorkflowStateStore: Send + Sync {
    fn save_workflow(&self, workflow: &Workflow) -> Result<(), StateStoreError>;
    fn load_workflow(&self, workflow_id: &str) -> Result<Option<Workflow>, StateStoreError>;
    fn list_workflows(&self) -> Result<Vec<Workflow>, StateStoreError>;
}

/// Reference implementation (spec §4.6 "the reference implementation is
/// in-process"). Does not tolerate restart.
#[derive(Default)]
pub struct InMemoryStateStore {
    workflows: Mutex<HashMap<String, Workflow>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkflowStateStore for InMemoryStateStore {
    fn save_workflow(&self, workflow: &Workflow) -> Result<(), StateStoreError> {
        self.workflows
            .lock()
            .insert(workflow.workflow_id.as_str().to_string(), workflow.clone());
        Ok(())
    }

    fn load_workflow(&self, workflow_id: &str) -> Result<Option<Workflow>, StateStoreError> {
        Ok(self.workflows.lock().get(workflow_id).cloned())
    }

    fn list_workflows(&self) -> Result<Vec<Workflow>, StateStoreError> {
        Ok(self.workflows.lock().values().cloned().collect())
    }
}

/// Filesystem-backed store for cross-process durability (spec §4.6 "an
/// alternative may persist to a key-value or relational store"). One JSON
/// file per workflow under `dir`, written with the same
/// tmp-write + fsync + rename + fsync-dir sequence as [`crate::checkpoint`].
pub struct FsStateStore<W: CheckpointWriter = FsCheckpointWriter> {
    dir: PathBuf,
    writer: W,
}

impl FsStateStore<FsCheckpointWriter> {
    pub fn new(dir: PathBuf) -> Self {
        Self::with_writer(FsCheckpointWriter, dir)
    }
}

impl<W: CheckpointWriter> FsStateStore<W> {
    pub fn with_writer(writer: W, dir: PathBuf) -> Self {
        Self { dir, writer }
    }

    fn path_for(&self, workflow_id: &str) -> PathBuf {
        self.dir.join(format!("{workflow_id}.json"))
    }
}

impl<W: CheckpointWriter> WorkflowStateStore for FsStateStore<W> {
    fn save_workflow(&self, workflow: &Workflow) -> Result<(), StateStoreError> {
        let path = self.path_for(workflow.workflow_id.as_str());
        let tmp_path = path.with_extension("tmp");
        let json = serde_json::to_vec(workflow)?;
        self.writer.write_tmp(&tmp_path, &json)?;
        self.writer.fsync_file(&tmp_path)?;
        self.writer.rename(&tmp_path, &path)?;
        if let Some(parent) = path.parent() {
            self.writer.fsync_dir(parent)?;
        }
        Ok(())
    }

    fn load_workflow(&self, workflow_id: &str) -> Result<Option<Workflow>, StateStoreError> {
        let path = self.path_for(workflow_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn list_workflows(&self) -> Result<Vec<Workflow>, StateStoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let bytes = std::fs::read(&path)?;
                out.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
