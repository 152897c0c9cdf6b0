// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`WorkerAdapter`] bridging the `validate` role to
//! `tf_sandbox::SandboxGateway` (spec §6 data flow: "calls... the Sandbox
//! for validation").

use crate::dispatch::DispatchRequest;
use crate::error::AdapterError;
use crate::worker::WorkerAdapter;
use async_trait::async_trait;
use std::path::PathBuf;
use tf_core::event::Event;
use tf_sandbox::gateway::ContainerRunner;
use tf_sandbox::types::{RunRequest, ResultClass, REPORT_FILENAME};
use tf_sandbox::SandboxGateway;

pub struct SandboxWorkerAdapter<R: ContainerRunner> {
    gateway: SandboxGateway<R>,
    output_root: PathBuf,
}

impl<R: ContainerRunner> SandboxWorkerAdapter<R> {
    pub fn new(gateway: SandboxGateway<R>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            output_root: output_root.into(),
        }
    }

    fn run_request(&self, request: &DispatchRequest) -> RunRequest {
        let output_dir = self
            .output_root
            .join(request.task.id.as_str())
            .display()
            .to_string();
        let mut artifacts = request.input_artifacts.iter();
        RunRequest {
            strategy_file: artifacts.next().cloned().unwrap_or_default(),
            test_files: artifacts.cloned().collect(),
            fixtures: request.fixtures.clone(),
            output_dir,
            timeout_s: request.task.timeout.as_secs(),
            seed: request
                .task
                .metadata
                .get("seed")
                .and_then(|v| v.as_u64()),
        }
    }
}

#[async_trait]
impl<R: ContainerRunner> WorkerAdapter for SandboxWorkerAdapter<R> {
    async fn handle_dispatch(&self, request: DispatchRequest) -> Result<Event, AdapterError> {
        let workflow_id = request.workflow_id.clone();
        let task_id = request.task.id.clone();
        let run_request = self.run_request(&request);
        let report_path = format!("{}/{REPORT_FILENAME}", run_request.output_dir);

        let result = self
            .gateway
            .run(run_request)
            .await
            .map_err(|e| AdapterError::Upstream(e.to_string()))?;

        match result.status {
            ResultClass::Passed => Ok(Event::TestPassed {
                workflow_id,
                task_id,
                report_path,
            }),
            other => Ok(Event::TestFailed {
                workflow_id,
                task_id,
                report_path,
                failures: failure_strings(other, &result),
            }),
        }
    }
}

fn failure_strings(class: ResultClass, result: &tf_sandbox::types::RunResult) -> Vec<String> {
    let mut failures = vec![format!("{class}")];
    for failure in &result.failures {
        failures.push(format!("{}: {}", failure.name, failure.message));
    }
    failures
}

#[cfg(test)]
#[path = "sandbox_worker_tests.rs"]
mod tests;
