// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tf-sandbox: isolated test-bundle execution, result classification, and
//! the shared slow-code failure-analysis table (spec §4.5, §4.7).

pub mod error;
pub mod failure_analysis;
pub mod gateway;
pub mod local_runner;
pub mod types;

pub use error::SandboxError;
pub use failure_analysis::{FailureAnalyzer, FailureHint};
pub use gateway::{ContainerRunner, SandboxGateway, SandboxGatewayConfig};
pub use local_runner::LocalProcessRunner;
pub use types::{
    DeterminismReport, RawExecution, Report, ResultClass, RunRequest, RunResult, TestFailure,
};

#[cfg(any(test, feature = "test-support"))]
pub use gateway::FakeContainerRunner;
