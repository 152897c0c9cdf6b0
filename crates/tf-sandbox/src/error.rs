// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox gateway errors (spec §4.5).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid failure-analysis pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Reported by a [`crate::ContainerRunner`] when the runner itself
    /// could not execute the request (container failed to start, host
    /// resource exhaustion). The gateway folds this into a `sandbox-error`
    /// classification rather than propagating it as a hard error.
    #[error("runner failed: {0}")]
    RunnerFailure(String),
}
