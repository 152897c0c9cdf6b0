// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git-backed `ArtifactStore` (spec §4.4).
//!
//! Every commit, tag, and tree mutation goes through `git2` object
//! plumbing rather than a checked-out working tree — there is no reason
//! to touch the filesystem outside `.git` for what is effectively a
//! versioned blob store.

use crate::error::ArtifactError;
use crate::secret_scan::SecretScanner;
use crate::store::ArtifactStore;
use crate::types::{CommitMetadata, CommitRequest, CommitResult, SidecarMetadata};
use git2::build::TreeUpdateBuilder;
use git2::{BranchType, FileMode, ObjectType, Repository, Signature};
use parking_lot::ReentrantMutex;
use std::path::Path;
use tracing::warn;

const METADATA_FILE: &str = "_metadata.json";

/// Configuration fixed at construction: branch naming, output layout,
/// commit identity, and optional push target.
pub struct GitArtifactStoreConfig {
    pub branch_prefix: String,
    pub output_root: String,
    pub author_name: String,
    pub author_email: String,
    /// Name of a configured remote to push to after each commit, if any.
    pub remote: Option<String>,
}

impl Default for GitArtifactStoreConfig {
    fn default() -> Self {
        Self {
            branch_prefix: "tf".to_string(),
            output_root: "artifacts".to_string(),
            author_name: "task-forge".to_string(),
            author_email: "task-forge@localhost".to_string(),
            remote: None,
        }
    }
}

pub struct GitArtifactStore {
    repo: ReentrantMutex<Repository>,
    config: GitArtifactStoreConfig,
    scanner: SecretScanner,
}

impl GitArtifactStore {
    pub fn open(repo_path: &Path, config: GitArtifactStoreConfig) -> Result<Self, ArtifactError> {
        let repo = Repository::open(repo_path)?;
        Ok(Self {
            repo: ReentrantMutex::new(repo),
            config,
            scanner: SecretScanner::new()?,
        })
    }

    pub fn init(repo_path: &Path, config: GitArtifactStoreConfig) -> Result<Self, ArtifactError> {
        let repo = Repository::init(repo_path)?;
        Ok(Self {
            repo: ReentrantMutex::new(repo),
            config,
            scanner: SecretScanner::new()?,
        })
    }

    fn branch_name(&self, workflow_id: &str, task_id: &str) -> String {
        format!("{}/{}/{}", self.config.branch_prefix, workflow_id, task_id)
    }

    fn signature(&self) -> Result<Signature<'static>, ArtifactError> {
        Ok(Signature::now(&self.config.author_name, &self.config.author_email)?)
    }

    fn push(&self, branch_ref: &str) -> Result<(), ArtifactError> {
        let remote_name = self
            .config
            .remote
            .as_deref()
            .ok_or_else(|| ArtifactError::TagNotFound("no remote configured".to_string()))?;
        let repo = self.repo.lock();
        let mut remote = repo.find_remote(remote_name)?;
        remote.push(&[format!("{branch_ref}:{branch_ref}")], None)?;
        Ok(())
    }

    /// Walk a commit's tree to find the single `_metadata.json` sidecar
    /// beneath `output_root` and deserialize it. Every commit on a task
    /// branch carries exactly one, under `<output_root>/<task_id>/`.
    fn read_sidecar(&self, commit: &git2::Commit) -> Result<Option<SidecarMetadata>, ArtifactError> {
        let repo = self.repo.lock();
        let tree = commit.tree()?;
        let Ok(root_entry) = tree.get_path(Path::new(&self.config.output_root)) else {
            return Ok(None);
        };
        let root_tree = root_entry.to_object(&repo)?.peel_to_tree()?;
        for task_entry in root_tree.iter() {
            let task_tree = match task_entry
                .to_object(&repo)
                .ok()
                .and_then(|obj| obj.into_tree().ok())
            {
                Some(task_tree) => task_tree,
                None => continue,
            };
            let task_name = task_entry.name().unwrap_or("?");
            if let Some(sidecar) = Self::sidecar_from_task_tree(&repo, &task_tree, task_name)? {
                return Ok(Some(sidecar));
            }
        }
        Ok(None)
    }

    /// Read and deserialize the `_metadata.json` sidecar directly beneath
    /// a single task's tree, if present.
    fn sidecar_from_task_tree(
        repo: &Repository,
        task_tree: &git2::Tree,
        task_name: &str,
    ) -> Result<Option<SidecarMetadata>, ArtifactError> {
        let metadata_entry = match task_tree.get_name(METADATA_FILE) {
            Some(metadata_entry) => metadata_entry,
            None => return Ok(None),
        };
        let blob = metadata_entry.to_object(repo)?.peel_to_blob()?;
        let sidecar: SidecarMetadata = serde_json::from_slice(blob.content())
            .map_err(|e| ArtifactError::MalformedSidecar {
                path: format!("{task_name}/_metadata.json"),
                reason: e.to_string(),
            })?;
        Ok(Some(sidecar))
    }

    fn metadata_from_tag(&self, tag_name: &str) -> Result<Option<CommitMetadata>, ArtifactError> {
        let repo = self.repo.lock();
        let reference = match repo.find_reference(&format!("refs/tags/{tag_name}")) {
            Ok(r) => r,
            Err(_) => return Ok(None),
        };
        let commit = reference.peel_to_commit()?;
        let sidecar = self.read_sidecar(&commit)?;
        Ok(sidecar.map(|sidecar| CommitMetadata {
            sidecar,
            revision_id: commit.id().to_string(),
        }))
    }
}

impl ArtifactStore for GitArtifactStore {
    fn commit(&self, request: CommitRequest) -> Result<CommitResult, ArtifactError> {
        self.scanner.scan(&request.files)?;

        let repo = self.repo.lock();
        let branch_name = self.branch_name(&request.workflow_id, &request.task_id);
        let branch_ref = format!("refs/heads/{branch_name}");

        let parent_commit = match repo.find_branch(&branch_name, BranchType::Local) {
            Ok(branch) => Some(branch.get().peel_to_commit()?),
            Err(_) => None,
        };
        let base_tree = match &parent_commit {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };

        let committed_at_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut updater = TreeUpdateBuilder::new();
        let mut file_paths = Vec::with_capacity(request.files.len());
        let task_dir = format!("{}/{}", self.config.output_root, request.task_id);

        for file in &request.files {
            let blob_oid = repo.blob(&file.contents)?;
            let path = format!("{task_dir}/{}", file.relative_path);
            updater.upsert(path, blob_oid, FileMode::Blob);
            file_paths.push(file.relative_path.clone());
        }

        let sidecar = SidecarMetadata {
            workflow_id: request.workflow_id.clone(),
            task_id: request.task_id.clone(),
            correlation_id: request.correlation_id.clone(),
            branch: branch_name.clone(),
            files: file_paths,
            committed_at_ms,
            prompt_hash: request.prompt_hash.clone(),
            inputs: request.metadata,
        };
        let sidecar_bytes = serde_json::to_vec_pretty(&sidecar)?;
        let sidecar_oid = repo.blob(&sidecar_bytes)?;
        updater.upsert(format!("{task_dir}/{METADATA_FILE}"), sidecar_oid, FileMode::Blob);

        let empty_tree;
        let base_tree_ref = match &base_tree {
            Some(tree) => tree,
            None => {
                let empty_tree_oid = repo.treebuilder(None)?.write()?;
                empty_tree = repo.find_tree(empty_tree_oid)?;
                &empty_tree
            }
        };
        let new_tree_oid = updater.create_updated(&repo, base_tree_ref)?;
        let new_tree = repo.find_tree(new_tree_oid)?;

        let signature = self.signature()?;
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();
        let message = format!("artifact: {} / {}", request.workflow_id, request.task_id);
        let commit_oid = repo.commit(
            Some(&branch_ref),
            &signature,
            &signature,
            &message,
            &new_tree,
            &parents,
        )?;

        let commit_object = repo.find_object(commit_oid, Some(ObjectType::Commit))?;
        let mut tags = Vec::new();
        // Every task in a workflow shares one correlation_id (spec §4.4:
        // "tag whose value contains the originating correlation_id"), so
        // the tag name must also carry the task_id or a later commit's
        // force-moved tag would orphan every earlier bundle under the same
        // correlation_id.
        let corr_tag = format!("corr_{}_{}", request.correlation_id, request.task_id);
        repo.tag_lightweight(&corr_tag, &commit_object, true)?;
        tags.push(corr_tag);
        if let Some(hash) = &request.prompt_hash {
            let prompt_tag = format!("prompt_{hash}");
            repo.tag_lightweight(&prompt_tag, &commit_object, true)?;
            tags.push(prompt_tag);
        }

        let pushed = match &self.config.remote {
            None => false,
            Some(_) => match self.push(&branch_ref) {
                Ok(()) => true,
                Err(e) => {
                    warn!(branch = %branch_ref, revision = %commit_oid, error = %e, "push failed, commit kept local");
                    false
                }
            },
        };

        Ok(CommitResult {
            branch: branch_name,
            revision_id: commit_oid.to_string(),
            tags,
            pushed,
        })
    }

    fn revert(&self, tag: &str, target_branch: &str) -> Result<String, ArtifactError> {
        let repo = self.repo.lock();
        let object = repo
            .find_reference(&format!("refs/tags/{tag}"))
            .map_err(|_| ArtifactError::TagNotFound(tag.to_string()))?;
        let tagged_commit = object.peel_to_commit()?;
        let tagged_tree = tagged_commit.tree()?;

        let branch_ref = format!("refs/heads/{target_branch}");
        let parent = match repo.find_branch(target_branch, BranchType::Local) {
            Ok(branch) => Some(branch.get().peel_to_commit()?),
            Err(_) => None,
        };

        let signature = self.signature()?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let message = format!("revert: restore tree from {tag} onto {target_branch}");
        let commit_oid = repo.commit(
            Some(&branch_ref),
            &signature,
            &signature,
            &message,
            &tagged_tree,
            &parents,
        )?;
        Ok(commit_oid.to_string())
    }

    fn list(&self, workflow_id: Option<&str>, limit: usize) -> Result<Vec<CommitMetadata>, ArtifactError> {
        let mut results = Vec::new();
        let tag_names = self.repo.lock().tag_names(Some("corr_*"))?;
        for tag_name in tag_names.iter().flatten() {
            if let Some(metadata) = self.metadata_from_tag(tag_name)? {
                if workflow_id.map_or(true, |w| metadata.sidecar.workflow_id == w) {
                    results.push(metadata);
                }
            }
        }
        results.sort_by(|a, b| b.sidecar.committed_at_ms.cmp(&a.sidecar.committed_at_ms));
        results.truncate(limit);
        Ok(results)
    }

    fn find_by_correlation(&self, correlation_id: &str) -> Result<Option<CommitMetadata>, ArtifactError> {
        let prefix = format!("corr_{correlation_id}_");
        let mut newest: Option<CommitMetadata> = None;
        let tag_names = self.repo.lock().tag_names(Some(&format!("{prefix}*")))?;
        for tag_name in tag_names.iter().flatten() {
            if let Some(metadata) = self.metadata_from_tag(tag_name)? {
                let is_newer = newest
                    .as_ref()
                    .map_or(true, |n| metadata.sidecar.committed_at_ms > n.sidecar.committed_at_ms);
                if is_newer {
                    newest = Some(metadata);
                }
            }
        }
        Ok(newest)
    }
}

#[cfg(test)]
#[path = "git_store_tests.rs"]
mod tests;
