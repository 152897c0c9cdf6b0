// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-based [`ContainerRunner`] for tests and environments without a
//! container runtime: `tokio::time::timeout` wrapping `Command::output()`,
//! child killed on drop when the timeout elapses.

use crate::error::SandboxError;
use crate::gateway::ContainerRunner;
use crate::types::{RawExecution, RunRequest};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Runs the strategy file through a plain interpreter subprocess. This is
/// not a sandbox — no network isolation, no resource caps — and exists
/// only as a fallback implementation of the [`ContainerRunner`] contract.
pub struct LocalProcessRunner {
    pub interpreter: String,
}

impl LocalProcessRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

#[async_trait]
impl ContainerRunner for LocalProcessRunner {
    async fn run(&self, request: &RunRequest) -> Result<RawExecution, SandboxError> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&request.strategy_file);
        cmd.args(&request.test_files);
        cmd.env("TF_SANDBOX_OUTPUT_DIR", &request.output_dir);
        if let Some(seed) = request.seed {
            cmd.env("TF_SANDBOX_SEED", seed.to_string());
        }
        cmd.kill_on_drop(true);

        let timeout = Duration::from_secs(request.timeout_s);
        let start = Instant::now();
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(RawExecution {
                exit_code: output.status.code().unwrap_or(-1),
                duration_s: start.elapsed().as_secs_f64(),
                stdout: output.stdout,
                stderr: output.stderr,
                timed_out: false,
            }),
            Ok(Err(io_err)) => Err(SandboxError::Io(io_err)),
            Err(_elapsed) => Ok(RawExecution {
                exit_code: -1,
                duration_s: start.elapsed().as_secs_f64(),
                stdout: Vec::new(),
                stderr: Vec::new(),
                timed_out: true,
            }),
        }
    }
}

#[cfg(test)]
#[path = "local_runner_tests.rs"]
mod tests;
