// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! tf-adapters: the role registry and the thin adapters translating
//! between the scheduler and its external collaborators — the provider
//! router, the sandbox gateway, and a pluggable plan producer (spec §4.6
//! "Plan/Worker Adapters", §9 "Dynamic dispatch").

pub mod dispatch;
pub mod error;
pub mod llm_worker;
pub mod plan_producer;
pub mod registry;
pub mod sandbox_worker;
pub mod worker;

pub use dispatch::DispatchRequest;
pub use error::AdapterError;
pub use llm_worker::LlmWorkerAdapter;
pub use plan_producer::{PlanProducer, PlanProducerError};
pub use registry::RoleRegistry;
pub use sandbox_worker::SandboxWorkerAdapter;
pub use worker::WorkerAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use plan_producer::FakePlanProducer;
#[cfg(any(test, feature = "test-support"))]
pub use worker::FakeWorkerAdapter;
