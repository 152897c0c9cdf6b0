// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `ArtifactStore` seam (spec §4.4 contract, rollback, queries).

use crate::error::ArtifactError;
use crate::types::{CommitMetadata, CommitRequest, CommitResult};

/// Versions a task's produced files into a backing revision store.
/// Implemented by [`crate::GitArtifactStore`] in production; git2 is
/// blocking, so every method here is synchronous — callers on an async
/// runtime are expected to dispatch through a blocking-task pool.
pub trait ArtifactStore: Send + Sync {
    fn commit(&self, request: CommitRequest) -> Result<CommitResult, ArtifactError>;

    /// Locate the revision tagged `tag`, move `target_branch` to a new
    /// revision matching its tree, and return the new revision id
    /// (spec §4.4 "Rollback").
    fn revert(&self, tag: &str, target_branch: &str) -> Result<String, ArtifactError>;

    fn list(&self, workflow_id: Option<&str>, limit: usize) -> Result<Vec<CommitMetadata>, ArtifactError>;

    fn find_by_correlation(&self, correlation_id: &str) -> Result<Option<CommitMetadata>, ArtifactError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use crate::types::SidecarMetadata;
    use parking_lot::Mutex;

    /// Scripted store double recording every call, backed by an in-memory
    /// list of committed metadata rather than a real repository.
    #[derive(Default)]
    pub struct FakeArtifactStore {
        commits: Mutex<Vec<CommitMetadata>>,
        next_revision: Mutex<u64>,
        reject_with: Mutex<Option<ArtifactError>>,
    }

    impl FakeArtifactStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next `commit` call fail with the given error, e.g. to
        /// exercise secret-scan rejection paths without a real scanner.
        pub fn reject_next_commit_with(&self, error: ArtifactError) {
            *self.reject_with.lock() = Some(error);
        }

        pub fn committed(&self) -> Vec<CommitMetadata> {
            self.commits.lock().clone()
        }
    }

    impl ArtifactStore for FakeArtifactStore {
        fn commit(&self, request: CommitRequest) -> Result<CommitResult, ArtifactError> {
            if let Some(error) = self.reject_with.lock().take() {
                return Err(error);
            }
            let mut next = self.next_revision.lock();
            *next += 1;
            let revision_id = format!("fake-rev-{next}");
            let branch = format!("tf/{}/{}", request.workflow_id, request.task_id);
            let mut tags = vec![format!("corr_{}_{}", request.correlation_id, request.task_id)];
            if let Some(hash) = &request.prompt_hash {
                tags.push(format!("prompt_{hash}"));
            }
            let sidecar = SidecarMetadata {
                workflow_id: request.workflow_id,
                task_id: request.task_id,
                correlation_id: request.correlation_id,
                branch: branch.clone(),
                files: request.files.iter().map(|f| f.relative_path.clone()).collect(),
                committed_at_ms: 0,
                prompt_hash: request.prompt_hash,
                inputs: request.metadata,
            };
            self.commits.lock().push(CommitMetadata {
                sidecar,
                revision_id: revision_id.clone(),
            });
            Ok(CommitResult {
                branch,
                revision_id,
                tags,
                pushed: false,
            })
        }

        fn revert(&self, tag: &str, _target_branch: &str) -> Result<String, ArtifactError> {
            let commits = self.commits.lock();
            commits
                .iter()
                .find(|c| format!("corr_{}_{}", c.sidecar.correlation_id, c.sidecar.task_id) == tag)
                .map(|c| c.revision_id.clone())
                .ok_or_else(|| ArtifactError::TagNotFound(tag.to_string()))
        }

        fn list(&self, workflow_id: Option<&str>, limit: usize) -> Result<Vec<CommitMetadata>, ArtifactError> {
            let commits = self.commits.lock();
            Ok(commits
                .iter()
                .filter(|c| workflow_id.map_or(true, |w| c.sidecar.workflow_id == w))
                .take(limit)
                .cloned()
                .collect())
        }

        fn find_by_correlation(&self, correlation_id: &str) -> Result<Option<CommitMetadata>, ArtifactError> {
            let commits = self.commits.lock();
            Ok(commits
                .iter()
                .rev()
                .find(|c| c.sidecar.correlation_id == correlation_id)
                .cloned())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeArtifactStore;
