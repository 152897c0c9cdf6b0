// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-role adapter seam (spec §6 "Worker-role contract", §9 "Dynamic
//! dispatch"). A thin-wrapper-over-an-external-system pattern, simplified
//! down to the single stateless call the worker contract actually needs:
//! one dispatch in, one result event out.

use crate::dispatch::DispatchRequest;
use crate::error::AdapterError;
use async_trait::async_trait;
use tf_core::event::Event;

/// One worker role's binding to whatever does the actual work — an LLM
/// request through the router, or a sandbox run. Implemented once per role
/// kind; a [`crate::registry::RoleRegistry`] maps the task graph's
/// `WorkerRole` tags onto instances of this trait (spec §9: "a role
/// registry (tag -> adapter) rather than reflection").
#[async_trait]
pub trait WorkerAdapter: Send + Sync + 'static {
    /// Run one dispatched task to completion and return the result event
    /// the scheduler should fold into task state. Always one of
    /// `Event::TaskCompleted`, `Event::TaskFailed`, `Event::TestPassed`, or
    /// `Event::TestFailed` — never another variant.
    async fn handle_dispatch(&self, request: DispatchRequest) -> Result<Event, AdapterError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Scripted worker double: returns queued results in order, recording
    /// every dispatch it receives (same shape as
    /// `tf_router::provider::FakeProviderAdapter`).
    #[derive(Default)]
    pub struct FakeWorkerAdapter {
        responses: Mutex<VecDeque<Result<Event, AdapterError>>>,
        requests: Arc<Mutex<Vec<DispatchRequest>>>,
    }

    impl FakeWorkerAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, result: Result<Event, AdapterError>) {
            self.responses.lock().push_back(result);
        }

        pub fn requests(&self) -> Vec<DispatchRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl WorkerAdapter for FakeWorkerAdapter {
        async fn handle_dispatch(&self, request: DispatchRequest) -> Result<Event, AdapterError> {
            self.requests.lock().push(request.clone());
            self.responses.lock().pop_front().unwrap_or_else(|| {
                Err(AdapterError::Upstream(
                    "no scripted response queued".to_string(),
                ))
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorkerAdapter;

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
