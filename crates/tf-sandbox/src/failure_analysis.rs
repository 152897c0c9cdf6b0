// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slow-code anti-pattern detection shared by the gateway's classifier and
//! the engine's branch classifier (spec §4.7).

use crate::error::SandboxError;
use regex::Regex;
use tf_core::FailureClass;

/// A detected anti-pattern and the fix-strategy hint delivered to the next
/// attempt's dispatch payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureHint {
    pub class: FailureClass,
    pub hint: &'static str,
}

/// Compiled pattern table (spec §4.7). Built once and reused across scans
/// since the patterns never change at runtime.
pub struct FailureAnalyzer {
    infinite_loop: Regex,
    row_iteration: Regex,
    sync_network: Regex,
    network_call: Regex,
}

impl FailureAnalyzer {
    pub fn new() -> Result<Self, SandboxError> {
        Ok(Self {
            infinite_loop: Regex::new(r"(?m)^\s*while\s+True\s*:")?,
            row_iteration: Regex::new(r"\.iterrows\(\)|\.itertuples\(\)")?,
            sync_network: Regex::new(r"requests\.(get|post|put|delete)\(|socket\.\w+\(|urllib\.request")?,
            network_call: Regex::new(r"(requests\.(?:get|post|put|delete)|socket\.\w+)\(([^)]*)\)")?,
        })
    }

    /// Scan a stderr/trace excerpt for known anti-patterns. Returns every
    /// hint that matched; an excerpt may trip more than one pattern.
    pub fn analyze(&self, excerpt: &str) -> Vec<FailureHint> {
        let mut hints = Vec::new();

        if self.infinite_loop.is_match(excerpt) {
            hints.push(FailureHint {
                class: FailureClass::Timeout,
                hint: "Bound loops with MAX_ITERATIONS; add break on condition.",
            });
        }
        if self.row_iteration.is_match(excerpt) {
            hints.push(FailureHint {
                class: FailureClass::Timeout,
                hint: "Vectorize; cap dataset size; avoid nested row loops.",
            });
        }
        if self.sync_network.is_match(excerpt) {
            hints.push(FailureHint {
                class: FailureClass::Timeout,
                hint: "Sandbox has no network; use injected data source.",
            });
        }
        if self
            .network_call
            .captures_iter(excerpt)
            .any(|cap| !cap[2].contains("timeout"))
        {
            hints.push(FailureHint {
                class: FailureClass::Timeout,
                hint: "Pass explicit timeout to all I/O.",
            });
        }

        hints
    }
}

#[cfg(test)]
#[path = "failure_analysis_tests.rs"]
mod tests;
