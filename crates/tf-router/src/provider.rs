// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider adapter seam: the wire format of any given LLM provider is
//! out of scope (spec Non-goals); this crate only depends on the shape
//! below, implemented once per provider elsewhere in the workspace.

use async_trait::async_trait;
use thiserror::Error;
use tf_core::{Credential, Message};

/// Safety configuration re-attached on every request so that a provider's
/// own defaults can never silently take over (spec §4.3 "attached at every
/// layer the provider supports").
#[derive(Debug, Clone)]
pub struct SafetySettings {
    pub block_categories: Vec<String>,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            block_categories: vec![
                "hate".to_string(),
                "violence".to_string(),
                "sexual".to_string(),
                "self_harm".to_string(),
            ],
        }
    }
}

/// One outgoing request to a provider for a single credential.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model_tag: Option<String>,
    /// Prior turns, already resolved from conversation history.
    pub history: Vec<Message>,
    pub prompt: String,
    pub estimated_tokens: u32,
    pub safety: SafetySettings,
}

/// A successful provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: String,
    pub model_used: String,
    pub tokens_used: u32,
}

/// Failure classes the router's request lifecycle branches on
/// (spec §4.3 steps 5-8).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Provider-reported rate limit. `retry_after_ms` is the provider's own
    /// hint, if it gave one.
    #[error("rate limited")]
    RateLimit { retry_after_ms: Option<u64> },
    /// Content rejected by the provider's safety filter — not an API fault.
    #[error("content safety rejection")]
    ContentSafety,
    /// Timeouts, 5xx, connection resets — worth a brief cooldown and retry.
    #[error("transient provider error: {0}")]
    Transient(String),
    /// Authentication failures, malformed requests — never retried.
    #[error("non-recoverable provider error: {0}")]
    NonRecoverable(String),
}

/// One provider's wire integration. Implemented once per upstream LLM
/// provider; the router is generic over it.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + 'static {
    async fn send(
        &self,
        credential: &Credential,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tf_core::KeyId;

    /// One recorded call to [`FakeProviderAdapter::send`].
    #[derive(Debug, Clone)]
    pub struct ProviderCall {
        pub key_id: KeyId,
        pub model_tag: Option<String>,
        pub prompt: String,
    }

    /// Scripted provider double: returns queued results in order, recording
    /// every call it receives (same shape as
    /// `tf-adapters`'s `FakeAgentAdapter`).
    #[derive(Default)]
    pub struct FakeProviderAdapter {
        responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
        calls: Arc<Mutex<Vec<ProviderCall>>>,
    }

    impl FakeProviderAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, result: Result<ProviderResponse, ProviderError>) {
            self.responses.lock().push_back(result);
        }

        pub fn calls(&self) -> Vec<ProviderCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ProviderAdapter for FakeProviderAdapter {
        async fn send(
            &self,
            credential: &Credential,
            request: &ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.calls.lock().push(ProviderCall {
                key_id: credential.key_id.clone(),
                model_tag: request.model_tag.clone(),
                prompt: request.prompt.clone(),
            });
            self.responses.lock().pop_front().unwrap_or_else(|| {
                Err(ProviderError::NonRecoverable(
                    "no scripted response queued".to_string(),
                ))
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProviderAdapter, ProviderCall};

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
