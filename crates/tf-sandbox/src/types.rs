// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response shapes for the sandbox gateway (spec §4.5 contract).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inputs to [`crate::SandboxGateway::run`].
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub strategy_file: String,
    pub test_files: Vec<String>,
    pub fixtures: Vec<String>,
    pub output_dir: String,
    pub timeout_s: u64,
    pub seed: Option<u64>,
}

/// Result classification (spec §4.5 "Result classification").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultClass {
    #[serde(rename = "passed")]
    Passed,
    #[serde(rename = "test-failed")]
    TestFailed,
    #[serde(rename = "static-failed")]
    StaticFailed,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "sandbox-error")]
    SandboxError,
    #[serde(rename = "schema-invalid")]
    SchemaInvalid,
}

impl std::fmt::Display for ResultClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResultClass::Passed => "passed",
            ResultClass::TestFailed => "test-failed",
            ResultClass::StaticFailed => "static-failed",
            ResultClass::Timeout => "timeout",
            ResultClass::SandboxError => "sandbox-error",
            ResultClass::SchemaInvalid => "schema-invalid",
        };
        write!(f, "{s}")
    }
}

/// One failing test or static check, surfaced to the caller and to the
/// engine's branch classifier.
#[derive(Debug, Clone)]
pub struct TestFailure {
    pub name: String,
    pub message: String,
    pub stack_excerpt: Option<String>,
}

/// Outcome of [`crate::SandboxGateway::run`] (spec §4.5 contract).
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: ResultClass,
    pub exit_code: i32,
    pub duration_s: f64,
    pub artifacts: Vec<String>,
    pub failures: Vec<TestFailure>,
    /// Numeric metrics parsed from the structured report, if any —
    /// consumed by [`crate::SandboxGateway::check_determinism`].
    pub metrics: HashMap<String, f64>,
}

/// Outcome of [`crate::SandboxGateway::check_determinism`] (spec §4.5).
#[derive(Debug, Clone)]
pub struct DeterminismReport {
    pub ok: bool,
    pub diffs: Vec<String>,
}

/// What a [`crate::ContainerRunner`] hands back before report parsing.
#[derive(Debug, Clone)]
pub struct RawExecution {
    pub exit_code: i32,
    pub duration_s: f64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

/// The structured report a test harness is expected to write into
/// `output_dir` (spec §4.5 "A structured report file is expected at a
/// known path").
#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub tests: Vec<ReportTest>,
    #[serde(default)]
    pub static_checks: Vec<ReportCheck>,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportTest {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stack_excerpt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportCheck {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub message: String,
}

pub const REPORT_FILENAME: &str = "report.json";
