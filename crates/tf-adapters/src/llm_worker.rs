// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`WorkerAdapter`] bridging `design`/`implement`/`repair` roles to
//! `tf_router::CredentialRouter` (spec §6 data flow: "calls the Router for
//! LLM work"). The specific content a provider returns is out of scope
//! (spec Non-goals) — this adapter only stages whatever text comes back as
//! an artifact file and reports its path.

use crate::dispatch::DispatchRequest;
use crate::error::AdapterError;
use crate::worker::WorkerAdapter;
use async_trait::async_trait;
use std::path::PathBuf;
use tf_core::event::{ArtifactRef, Event};
use tf_core::Clock;
use tf_router::provider::ProviderAdapter;
use tf_router::router::{CredentialRouter, RouterRequest};
use tf_router::RouterError;
use tf_ratelimit::RateLimiterStore;

/// Rough chars-per-token ratio used for the estimate the router's rate
/// limiter reserves against (spec §9 "Token estimation": imprecise by
/// design, corrected after the fact from the provider's reported usage).
const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

pub struct LlmWorkerAdapter<P, S, C> {
    router: CredentialRouter<P, S, C>,
    output_root: PathBuf,
}

impl<P, S, C> LlmWorkerAdapter<P, S, C>
where
    P: ProviderAdapter,
    S: RateLimiterStore,
    C: Clock,
{
    pub fn new(router: CredentialRouter<P, S, C>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            router,
            output_root: output_root.into(),
        }
    }

    fn prompt(&self, request: &DispatchRequest) -> String {
        let mut prompt = request.task.description.clone();
        if let Some(parent) = &request.parent_description {
            prompt.push_str("\n\nOriginal task:\n");
            prompt.push_str(parent);
        }
        if let Some(hint) = &request.fix_hint {
            prompt.push_str("\n\nFix hint:\n");
            prompt.push_str(hint);
        }
        prompt
    }
}

#[async_trait]
impl<P, S, C> WorkerAdapter for LlmWorkerAdapter<P, S, C>
where
    P: ProviderAdapter,
    S: RateLimiterStore + 'static,
    C: Clock,
{
    async fn handle_dispatch(&self, request: DispatchRequest) -> Result<Event, AdapterError> {
        let workflow_id = request.workflow_id.clone();
        let task_id = request.task.id.clone();
        let attempt = request.attempt;
        let prompt = self.prompt(&request);
        let estimated_tokens = (prompt.len() / CHARS_PER_TOKEN_ESTIMATE).max(1) as u32;

        let router_request = RouterRequest {
            model_preference: None,
            workload_tier: None,
            conversation_id: None,
            estimated_tokens,
            prompt,
        };

        match self.router.dispatch(router_request).await {
            Ok(response) => {
                let dir = self.output_root.join(task_id.as_str());
                tokio::fs::create_dir_all(&dir)
                    .await
                    .map_err(|e| AdapterError::Upstream(e.to_string()))?;
                let path = dir.join("output.txt");
                tokio::fs::write(&path, response.content.as_bytes())
                    .await
                    .map_err(|e| AdapterError::Upstream(e.to_string()))?;
                Ok(Event::TaskCompleted {
                    workflow_id,
                    task_id,
                    attempt,
                    artifacts: vec![ArtifactRef {
                        path: path.display().to_string(),
                    }],
                    metrics: None,
                })
            }
            Err(err) => Ok(Event::TaskFailed {
                workflow_id,
                task_id,
                attempt,
                failures: vec![router_failure_message(&err)],
                logs_path: None,
            }),
        }
    }
}

fn router_failure_message(err: &RouterError) -> String {
    match err {
        RouterError::NoKeyAvailable { earliest_retry_ms } => {
            format!("no-key-available: earliest retry at {earliest_retry_ms:?}")
        }
        RouterError::RetriesExhausted { attempts, last_error } => {
            format!("retries exhausted after {attempts} attempt(s): {last_error}")
        }
        RouterError::NonRecoverable(message) => format!("non-recoverable: {message}"),
        RouterError::SafetyBlock => "safety-block".to_string(),
    }
}

#[cfg(test)]
#[path = "llm_worker_tests.rs"]
mod tests;
