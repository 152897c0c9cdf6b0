// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SandboxGateway`: runs a test bundle via a pluggable [`ContainerRunner`]
//! and classifies the outcome (spec §4.5).

use crate::error::SandboxError;
use crate::types::{
    DeterminismReport, RawExecution, Report, ResultClass, RunRequest, RunResult, TestFailure,
    REPORT_FILENAME,
};
use async_trait::async_trait;
use std::path::Path;

/// The isolated execution environment (ephemeral container or equivalent).
/// Network, memory, CPU, and wall-clock caps are this collaborator's
/// responsibility — the gateway only consumes its contract.
#[async_trait]
pub trait ContainerRunner: Send + Sync + 'static {
    async fn run(&self, request: &RunRequest) -> Result<RawExecution, SandboxError>;
}

#[async_trait]
impl<T: ContainerRunner + ?Sized> ContainerRunner for std::sync::Arc<T> {
    async fn run(&self, request: &RunRequest) -> Result<RawExecution, SandboxError> {
        (**self).run(request).await
    }
}

pub struct SandboxGatewayConfig {
    /// Tolerance used by `check_determinism` when comparing key metrics
    /// across runs.
    pub determinism_tolerance: f64,
}

impl Default for SandboxGatewayConfig {
    fn default() -> Self {
        Self {
            determinism_tolerance: 1e-6,
        }
    }
}

pub struct SandboxGateway<R: ContainerRunner> {
    runner: R,
    config: SandboxGatewayConfig,
}

impl<R: ContainerRunner> SandboxGateway<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            config: SandboxGatewayConfig::default(),
        }
    }

    pub fn with_config(runner: R, config: SandboxGatewayConfig) -> Self {
        Self { runner, config }
    }

    pub async fn run(&self, request: RunRequest) -> Result<RunResult, SandboxError> {
        let execution = match self.runner.run(&request).await {
            Ok(execution) => execution,
            Err(SandboxError::RunnerFailure(message)) => {
                return Ok(infra_fault(message));
            }
            Err(other) => return Err(other),
        };

        if execution.timed_out {
            return Ok(timeout_result(&request, &execution));
        }

        let report_path = Path::new(&request.output_dir).join(REPORT_FILENAME);
        let report = match std::fs::read(&report_path) {
            Ok(bytes) => match serde_json::from_slice::<Report>(&bytes) {
                Ok(report) => report,
                Err(e) => return Ok(schema_invalid(&execution, format!("report did not parse: {e}"))),
            },
            Err(_) => {
                return Ok(schema_invalid(
                    &execution,
                    "missing-report: no structured report found at expected path".to_string(),
                ));
            }
        };

        let static_failures: Vec<TestFailure> = report
            .static_checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| TestFailure {
                name: c.name.clone(),
                message: c.message.clone(),
                stack_excerpt: None,
            })
            .collect();
        if !static_failures.is_empty() {
            return Ok(RunResult {
                status: ResultClass::StaticFailed,
                exit_code: execution.exit_code,
                duration_s: execution.duration_s,
                artifacts: list_artifacts(&request.output_dir)?,
                failures: static_failures,
                metrics: report.metrics,
            });
        }

        let test_failures: Vec<TestFailure> = report
            .tests
            .iter()
            .filter(|t| !t.passed)
            .map(|t| TestFailure {
                name: t.name.clone(),
                message: t.message.clone(),
                stack_excerpt: t.stack_excerpt.clone(),
            })
            .collect();
        if !test_failures.is_empty() {
            return Ok(RunResult {
                status: ResultClass::TestFailed,
                exit_code: execution.exit_code,
                duration_s: execution.duration_s,
                artifacts: list_artifacts(&request.output_dir)?,
                failures: test_failures,
                metrics: report.metrics,
            });
        }

        if execution.exit_code != 0 {
            return Ok(RunResult {
                status: ResultClass::SandboxError,
                exit_code: execution.exit_code,
                duration_s: execution.duration_s,
                artifacts: list_artifacts(&request.output_dir)?,
                failures: vec![TestFailure {
                    name: "<process>".to_string(),
                    message: format!("exited {} with no reported failures", execution.exit_code),
                    stack_excerpt: None,
                }],
                metrics: report.metrics,
            });
        }

        Ok(RunResult {
            status: ResultClass::Passed,
            exit_code: 0,
            duration_s: execution.duration_s,
            artifacts: list_artifacts(&request.output_dir)?,
            failures: Vec::new(),
            metrics: report.metrics,
        })
    }

    /// Run the same request twice with an identical seed and compare key
    /// metrics within `determinism_tolerance` (spec §4.5 "Determinism check
    /// helper").
    pub async fn check_determinism(
        &self,
        template: RunRequest,
        seed: u64,
        runs: usize,
    ) -> Result<DeterminismReport, SandboxError> {
        let runs = runs.max(1);
        let mut all_metrics = Vec::with_capacity(runs);
        for i in 0..runs {
            let mut request = template.clone();
            request.seed = Some(seed);
            request.output_dir = format!("{}/determinism_run_{i}", template.output_dir);
            let result = self.run(request).await?;
            all_metrics.push(result.metrics);
        }

        let mut diffs = Vec::new();
        if let Some(baseline) = all_metrics.first().cloned() {
            for (run_index, metrics) in all_metrics.iter().enumerate().skip(1) {
                for (key, base_value) in &baseline {
                    let other = metrics.get(key).copied();
                    match other {
                        Some(value) if (value - base_value).abs() <= self.config.determinism_tolerance => {}
                        Some(value) => diffs.push(format!(
                            "run {run_index} metric '{key}' diverged: {base_value} vs {value}"
                        )),
                        None => diffs.push(format!("run {run_index} missing metric '{key}'")),
                    }
                }
            }
        }

        Ok(DeterminismReport {
            ok: diffs.is_empty(),
            diffs,
        })
    }
}

fn infra_fault(message: String) -> RunResult {
    RunResult {
        status: ResultClass::SandboxError,
        exit_code: -1,
        duration_s: 0.0,
        artifacts: Vec::new(),
        failures: vec![TestFailure {
            name: "<runner>".to_string(),
            message,
            stack_excerpt: None,
        }],
        metrics: Default::default(),
    }
}

fn schema_invalid(execution: &RawExecution, message: String) -> RunResult {
    RunResult {
        status: ResultClass::SchemaInvalid,
        exit_code: execution.exit_code,
        duration_s: execution.duration_s,
        artifacts: Vec::new(),
        failures: vec![TestFailure {
            name: "<report>".to_string(),
            message,
            stack_excerpt: None,
        }],
        metrics: Default::default(),
    }
}

fn timeout_result(request: &RunRequest, execution: &RawExecution) -> RunResult {
    let last_line = last_nonempty_line(&execution.stdout)
        .or_else(|| last_nonempty_line(&execution.stderr));
    RunResult {
        status: ResultClass::Timeout,
        exit_code: execution.exit_code,
        duration_s: execution.duration_s,
        artifacts: Vec::new(),
        failures: vec![TestFailure {
            name: "<timeout>".to_string(),
            message: format!("execution exceeded {}s", request.timeout_s),
            stack_excerpt: last_line,
        }],
        metrics: Default::default(),
    }
}

fn last_nonempty_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(str::to_string)
}

fn list_artifacts(output_dir: &str) -> Result<Vec<String>, SandboxError> {
    let mut paths = Vec::new();
    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(paths),
    };
    for entry in entries {
        let entry = entry?;
        if entry.file_name() == REPORT_FILENAME {
            continue;
        }
        paths.push(entry.path().to_string_lossy().into_owned());
    }
    paths.sort();
    Ok(paths)
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Scripted [`ContainerRunner`] double recording every request,
    /// mirroring `tf-router::provider::FakeProviderAdapter`.
    #[derive(Default)]
    pub struct FakeContainerRunner {
        responses: Mutex<VecDeque<Result<RawExecution, SandboxError>>>,
        requests: Arc<Mutex<Vec<RunRequest>>>,
    }

    impl FakeContainerRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, response: Result<RawExecution, SandboxError>) {
            self.responses.lock().push_back(response);
        }

        pub fn requests(&self) -> Vec<RunRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl ContainerRunner for FakeContainerRunner {
        async fn run(&self, request: &RunRequest) -> Result<RawExecution, SandboxError> {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(SandboxError::RunnerFailure("no scripted response queued".to_string())))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeContainerRunner;

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
