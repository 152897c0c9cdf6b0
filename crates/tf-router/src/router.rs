// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The credential router itself: key selection plus the per-request retry
//! state machine (spec §4.3).

use crate::backoff::{calculate_delay_ms, RetryStrategyConfig};
use crate::conversation_store::ConversationStore;
use crate::error::RouterError;
use crate::prompt::soften_prompt;
use crate::provider::{ProviderAdapter, ProviderError, ProviderRequest, SafetySettings};
use std::collections::HashSet;
use tf_core::{Clock, Credential, KeyId, Message, Role, WorkloadTag};
use tf_ratelimit::RateLimiterStore;

/// Workload tier a request can be escalated through on a content-safety
/// rejection (spec §4.3 step 6: "light→medium→heavy").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadTier {
    Light,
    Medium,
    Heavy,
}

impl WorkloadTier {
    pub fn as_tag(self) -> WorkloadTag {
        match self {
            WorkloadTier::Light => WorkloadTag::from("light"),
            WorkloadTier::Medium => WorkloadTag::from("medium"),
            WorkloadTier::Heavy => WorkloadTag::from("heavy"),
        }
    }

    /// Next tier up, or `None` if already at the top.
    pub fn escalate(self) -> Option<Self> {
        match self {
            WorkloadTier::Light => Some(WorkloadTier::Medium),
            WorkloadTier::Medium => Some(WorkloadTier::Heavy),
            WorkloadTier::Heavy => None,
        }
    }
}

/// Inbound request to [`CredentialRouter::dispatch`].
#[derive(Debug, Clone)]
pub struct RouterRequest {
    pub model_preference: Option<String>,
    pub workload_tier: Option<WorkloadTier>,
    pub conversation_id: Option<tf_core::ConversationId>,
    pub estimated_tokens: u32,
    pub prompt: String,
}

/// Successful router outcome.
#[derive(Debug, Clone)]
pub struct RouterResponse {
    pub content: String,
    pub model_used: String,
    pub key_used: KeyId,
    pub tokens: u32,
}

/// Tunables for one router instance.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Global cap on attempts per `dispatch` call (spec §4.3 default: 3).
    pub global_max_retries: u32,
    pub conversation_ttl_ms: u64,
    pub backoff: RetryStrategyConfig,
    pub safety: SafetySettings,
    /// Cooldown applied to a key on a rate-limit error when the provider
    /// gives no retry hint.
    pub default_rate_limit_cooldown_ms: u64,
    /// Cooldown applied to a key on a transient provider error.
    pub transient_cooldown_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            global_max_retries: 3,
            conversation_ttl_ms: 30 * 60_000,
            backoff: RetryStrategyConfig::default(),
            safety: SafetySettings::default(),
            default_rate_limit_cooldown_ms: 30_000,
            transient_cooldown_ms: 5_000,
        }
    }
}

/// Selects a healthy credential for a request, drives the retry/escalation
/// state machine, and owns conversation history (spec §4.3).
///
/// Generic over the provider adapter, the rate-limiter store, and the
/// clock so the whole lifecycle is exercisable with fakes.
pub struct CredentialRouter<P, S, C> {
    credentials: Vec<Credential>,
    provider: P,
    rate_limiter: S,
    clock: C,
    conversations: ConversationStore<C>,
    config: RouterConfig,
}

impl<P, S, C> CredentialRouter<P, S, C>
where
    P: ProviderAdapter,
    S: RateLimiterStore,
    C: Clock,
{
    pub fn new(credentials: Vec<Credential>, provider: P, rate_limiter: S, clock: C, config: RouterConfig) -> Self {
        let conversations = ConversationStore::new(clock.clone(), config.conversation_ttl_ms);
        Self {
            credentials,
            provider,
            rate_limiter,
            clock,
            conversations,
            config,
        }
    }

    fn credential(&self, key: &KeyId) -> Option<&Credential> {
        self.credentials.iter().find(|c| &c.key_id == key)
    }

    /// Filter and rank candidates for one attempt (spec §4.3 "Key
    /// selection"). Returns the chosen key, or `NoKeyAvailable` naming the
    /// earliest cooldown-expiry among otherwise-matching keys.
    async fn select_key(
        &self,
        model_preference: Option<&str>,
        tier: Option<WorkloadTier>,
        excluded: &HashSet<KeyId>,
    ) -> Result<KeyId, RouterError> {
        let tier_tag = tier.map(WorkloadTier::as_tag);
        let mut matching = Vec::new();
        for credential in &self.credentials {
            if !credential.active || excluded.contains(&credential.key_id) {
                continue;
            }
            if let Some(pref) = model_preference {
                if credential.model_tag.as_deref() != Some(pref) {
                    continue;
                }
            }
            if !credential.matches_workload(tier_tag.as_ref()) {
                continue;
            }
            matching.push(credential);
        }

        let mut candidates = Vec::with_capacity(matching.len());
        for credential in &matching {
            if !self.rate_limiter.cooldown_active(&credential.key_id).await {
                candidates.push(*credential);
            }
        }

        if candidates.is_empty() {
            let mut earliest = None;
            for credential in &matching {
                if let Some(until) = self.rate_limiter.cooldown_until_ms(&credential.key_id).await {
                    earliest = Some(earliest.map_or(until, |e: u64| e.min(until)));
                }
            }
            return Err(RouterError::NoKeyAvailable {
                earliest_retry_ms: earliest,
            });
        }

        let mut ranked = Vec::with_capacity(candidates.len());
        for credential in candidates {
            let tightness = i32::from(credential.workload_tag.is_some());
            let capacity = self
                .rate_limiter
                .remaining_capacity(&credential.key_id, credential.rpm_limit, credential.tpm_limit)
                .await;
            ranked.push((credential, tightness, capacity));
        }
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.total_cmp(&a.2))
                .then_with(|| a.0.key_id.as_str().cmp(b.0.key_id.as_str()))
        });

        Ok(ranked[0].0.key_id.clone())
    }

    async fn sleep_backoff(&self, attempt: u32) {
        let delay_ms = calculate_delay_ms(&self.config.backoff, attempt);
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }
    }

    /// Drive one request through the full lifecycle (spec §4.3 "Request
    /// lifecycle"): select, reserve, dispatch, classify-and-retry.
    pub async fn dispatch(&self, request: RouterRequest) -> Result<RouterResponse, RouterError> {
        let mut excluded: HashSet<KeyId> = HashSet::new();
        let mut tier = request.workload_tier;
        let mut prompt = request.prompt.clone();
        let mut softened = false;
        let mut last_error = String::new();

        for attempt in 1..=self.config.global_max_retries {
            let key = self
                .select_key(request.model_preference.as_deref(), tier, &excluded)
                .await?;
            // credential() never fails: `key` was just drawn from
            // `self.credentials` by select_key.
            let credential = match self.credential(&key) {
                Some(c) => c,
                None => continue,
            };

            let reservation = self
                .rate_limiter
                .reserve(&key, request.estimated_tokens, credential.rpm_limit, credential.tpm_limit)
                .await;
            if !reservation.is_reserved() {
                excluded.insert(key.clone());
                last_error = "reservation failed".to_string();
                self.sleep_backoff(attempt).await;
                continue;
            }

            let history = request
                .conversation_id
                .as_ref()
                .map(|id| self.conversations.history(id))
                .unwrap_or_default();
            let provider_request = ProviderRequest {
                model_tag: request.model_preference.clone(),
                history,
                prompt: prompt.clone(),
                estimated_tokens: request.estimated_tokens,
                safety: self.config.safety.clone(),
            };

            match self.provider.send(credential, &provider_request).await {
                Ok(response) => {
                    self.rate_limiter
                        .correct(&key, request.estimated_tokens, response.tokens_used)
                        .await;
                    if let Some(id) = &request.conversation_id {
                        let user = Message {
                            role: Role::User,
                            content: prompt.clone(),
                            tokens_estimate: request.estimated_tokens,
                        };
                        let assistant = Message {
                            role: Role::Assistant,
                            content: response.content.clone(),
                            tokens_estimate: response.tokens_used,
                        };
                        self.conversations.append_turn(id, user, assistant);
                    }
                    return Ok(RouterResponse {
                        content: response.content,
                        model_used: response.model_used,
                        key_used: key,
                        tokens: response.tokens_used,
                    });
                }
                Err(ProviderError::RateLimit { retry_after_ms }) => {
                    let until = self.clock.epoch_ms()
                        + retry_after_ms.unwrap_or(self.config.default_rate_limit_cooldown_ms);
                    self.rate_limiter.cooldown(&key, until).await;
                    excluded.insert(key.clone());
                    last_error = "rate_limit".to_string();
                }
                Err(ProviderError::ContentSafety) => {
                    excluded.insert(key.clone());
                    last_error = "content_safety".to_string();
                    if let Some(next) = tier.and_then(WorkloadTier::escalate) {
                        tier = Some(next);
                    } else if !softened {
                        prompt = soften_prompt(&prompt);
                        softened = true;
                        tier = Some(WorkloadTier::Heavy);
                    } else {
                        return Err(RouterError::SafetyBlock);
                    }
                }
                Err(ProviderError::Transient(message)) => {
                    let until = self.clock.epoch_ms() + self.config.transient_cooldown_ms;
                    self.rate_limiter.cooldown(&key, until).await;
                    excluded.insert(key.clone());
                    last_error = message;
                }
                Err(ProviderError::NonRecoverable(message)) => {
                    return Err(RouterError::NonRecoverable(message));
                }
            }
            self.sleep_backoff(attempt).await;
        }

        Err(RouterError::RetriesExhausted {
            attempts: self.config.global_max_retries,
            last_error,
        })
    }

    /// Rollback path (spec §4.3 "Fallback"): callers that disable the
    /// router invoke the provider directly with an explicit key, and own
    /// conversation history themselves. No selection, reservation, or
    /// retry logic runs.
    pub async fn dispatch_direct(
        &self,
        key_id: &KeyId,
        request: &ProviderRequest,
    ) -> Result<crate::provider::ProviderResponse, ProviderError> {
        let credential = self
            .credential(key_id)
            .ok_or_else(|| ProviderError::NonRecoverable(format!("unknown key: {key_id}")))?;
        self.provider.send(credential, request).await
    }

    /// Background maintenance hook for idle-conversation eviction,
    /// independent of request traffic.
    pub fn evict_expired_conversations(&self) {
        self.conversations.evict_expired();
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
