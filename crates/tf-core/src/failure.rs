// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared failure taxonomy (spec §4.6 step 2, §4.7, §7).

use serde::{Deserialize, Serialize};

/// Classification of a terminal task failure, used to route branch tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    ImplementationBug,
    SpecMismatch,
    Timeout,
    MissingDependency,
    FlakyTest,
    Unknown,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureClass::ImplementationBug => "implementation_bug",
            FailureClass::SpecMismatch => "spec_mismatch",
            FailureClass::Timeout => "timeout",
            FailureClass::MissingDependency => "missing_dependency",
            FailureClass::FlakyTest => "flaky_test",
            FailureClass::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl FailureClass {
    /// Heuristic classification from stderr text when the sandbox's
    /// structured `failures[]` is unavailable (spec §4.6 step 2).
    pub fn from_stderr_heuristic(stderr: &str) -> Self {
        if stderr.contains("ImportError") || stderr.contains("ModuleNotFoundError") {
            return FailureClass::MissingDependency;
        }
        if stderr.contains("AssertionError") {
            return if stderr.contains("signature") || stderr.contains("TypeError: ") {
                FailureClass::SpecMismatch
            } else {
                FailureClass::ImplementationBug
            };
        }
        if stderr.contains("timeout") || stderr.contains("TimeoutError") {
            return FailureClass::Timeout;
        }
        FailureClass::Unknown
    }
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
