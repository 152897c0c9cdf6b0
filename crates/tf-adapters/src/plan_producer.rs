// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan-producer seam (spec §1: "Natural-language→task-graph translation
//! is treated as a pluggable 'plan producer' — the core must accept any
//! valid task graph"). The decomposition logic itself is an external
//! collaborator; only its contract is specified here, mirroring the way
//! `tf_router::provider::ProviderAdapter` specifies a provider's contract
//! without implementing one.

use async_trait::async_trait;
use thiserror::Error;
use tf_core::graph::TaskGraph;

/// Failure a plan producer reports instead of a graph.
#[derive(Debug, Clone, Error)]
pub enum PlanProducerError {
    #[error("could not decompose request: {0}")]
    DecompositionFailed(String),
}

/// Translates a natural-language request into a [`TaskGraph`]. The core
/// only ever consumes the graph this returns — it does not inspect or
/// validate the natural-language input itself (spec Non-goals).
#[async_trait]
pub trait PlanProducer: Send + Sync + 'static {
    async fn propose(&self, request: &str) -> Result<TaskGraph, PlanProducerError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted plan producer: returns queued graphs in order, recording
    /// every request string it receives.
    #[derive(Default)]
    pub struct FakePlanProducer {
        responses: Mutex<VecDeque<Result<TaskGraph, PlanProducerError>>>,
        requests: Mutex<Vec<String>>,
    }

    impl FakePlanProducer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, result: Result<TaskGraph, PlanProducerError>) {
            self.responses.lock().push_back(result);
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl PlanProducer for FakePlanProducer {
        async fn propose(&self, request: &str) -> Result<TaskGraph, PlanProducerError> {
            self.requests.lock().push(request.to_string());
            self.responses.lock().pop_front().unwrap_or_else(|| {
                Err(PlanProducerError::DecompositionFailed(
                    "no scripted response queued".to_string(),
                ))
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePlanProducer;

#[cfg(test)]
#[path = "plan_producer_tests.rs"]
mod tests;
