// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact store errors (spec §4.4).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// A secret-pattern match was found before any write occurred
    /// (spec §4.4 step 1: "do not write anything").
    #[error("secret detected in {file}")]
    SecretDetected { file: String },

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("invalid secret pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error("malformed sidecar metadata at {path}: {reason}")]
    MalformedSidecar { path: String, reason: String },
}
