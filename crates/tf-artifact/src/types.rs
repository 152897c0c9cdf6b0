// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response and sidecar-metadata shapes for the artifact store
//! (spec §4.4).

use serde::{Deserialize, Serialize};

/// One file produced by a task, to be committed under the task's output
/// directory.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub relative_path: String,
    pub contents: Vec<u8>,
}

/// Inputs to [`crate::ArtifactStore::commit`].
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub workflow_id: String,
    pub task_id: String,
    pub files: Vec<ArtifactFile>,
    /// Caller-supplied inputs recorded in the sidecar file verbatim.
    pub metadata: serde_json::Value,
    pub correlation_id: String,
    pub prompt_hash: Option<String>,
}

/// Outcome of a successful commit (spec §4.4 contract).
#[derive(Debug, Clone)]
pub struct CommitResult {
    pub branch: String,
    pub revision_id: String,
    pub tags: Vec<String>,
    pub pushed: bool,
}

/// The sidecar file written alongside every commit's copied files
/// (spec §4.4 step 4). Holds everything `list`/`find_by_correlation` need
/// without reading commit messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarMetadata {
    pub workflow_id: String,
    pub task_id: String,
    pub correlation_id: String,
    pub branch: String,
    pub files: Vec<String>,
    pub committed_at_ms: u64,
    #[serde(default)]
    pub prompt_hash: Option<String>,
    #[serde(default)]
    pub inputs: serde_json::Value,
}

/// A sidecar record plus the revision it was read from — the shape
/// `list`/`find_by_correlation` return (spec §4.4 "Queries").
#[derive(Debug, Clone)]
pub struct CommitMetadata {
    pub sidecar: SidecarMetadata,
    pub revision_id: String,
}
