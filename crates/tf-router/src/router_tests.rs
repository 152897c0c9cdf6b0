// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::backoff::RetryStrategyConfig;
use crate::provider::{FakeProviderAdapter, ProviderResponse};
use tf_core::{ConversationId, FakeClock};
use tf_ratelimit::InMemoryRateLimiterStore;

fn no_delay_config() -> RouterConfig {
    RouterConfig {
        backoff: RetryStrategyConfig {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: 0.0,
        },
        ..RouterConfig::default()
    }
}

fn credential(key: &str, workload: Option<&str>) -> Credential {
    Credential {
        key_id: KeyId::new(key),
        provider_tag: "anthropic".into(),
        model_tag: None,
        workload_tag: workload.map(WorkloadTag::from),
        rpm_limit: Some(100),
        tpm_limit: Some(100_000),
        daily_limit: None,
        active: true,
    }
}

fn router(
    credentials: Vec<Credential>,
    provider: FakeProviderAdapter,
) -> CredentialRouter<FakeProviderAdapter, InMemoryRateLimiterStore<FakeClock>, FakeClock> {
    let clock = FakeClock::new(0);
    let store = InMemoryRateLimiterStore::new(clock.clone());
    CredentialRouter::new(credentials, provider, store, clock, no_delay_config())
}

fn ok(content: &str) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        content: content.to_string(),
        model_used: "m1".to_string(),
        tokens_used: 3,
    })
}

#[tokio::test]
async fn dispatch_returns_successful_response() {
    let provider = FakeProviderAdapter::new();
    provider.push_response(ok("hello"));
    let router = router(vec![credential("k1", None)], provider);

    let response = router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: None,
            conversation_id: None,
            estimated_tokens: 10,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.content, "hello");
    assert_eq!(response.key_used.as_str(), "k1");
}

#[tokio::test]
async fn no_candidate_reports_no_key_available() {
    let provider = FakeProviderAdapter::new();
    let router = router(vec![credential("k1", Some("heavy"))], provider);

    let error = router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: Some(WorkloadTier::Light),
            conversation_id: None,
            estimated_tokens: 1,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, RouterError::NoKeyAvailable { .. }));
}

#[tokio::test]
async fn rate_limit_error_cools_down_and_retries_with_a_different_key() {
    let provider = FakeProviderAdapter::new();
    provider.push_response(Err(ProviderError::RateLimit {
        retry_after_ms: Some(1_000),
    }));
    provider.push_response(ok("from k2"));
    let router = router(
        vec![credential("k1", None), credential("k2", None)],
        provider,
    );

    let response = router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: None,
            conversation_id: None,
            estimated_tokens: 1,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.key_used.as_str(), "k2");
}

#[tokio::test]
async fn content_safety_error_escalates_tier_without_cooldown() {
    let provider = FakeProviderAdapter::new();
    provider.push_response(Err(ProviderError::ContentSafety));
    provider.push_response(ok("escalated"));
    let router = router(
        vec![
            credential("light-key", Some("light")),
            credential("medium-key", Some("medium")),
        ],
        provider,
    );

    let response = router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: Some(WorkloadTier::Light),
            conversation_id: None,
            estimated_tokens: 1,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.key_used.as_str(), "medium-key");
}

#[tokio::test]
async fn content_safety_error_returns_safety_block_once_all_tiers_and_softening_are_exhausted() {
    let provider = FakeProviderAdapter::new();
    for _ in 0..4 {
        provider.push_response(Err(ProviderError::ContentSafety));
    }
    let config = RouterConfig {
        global_max_retries: 4,
        ..no_delay_config()
    };
    let clock = FakeClock::new(0);
    let store = InMemoryRateLimiterStore::new(clock.clone());
    let router = CredentialRouter::new(
        vec![
            credential("light-key", Some("light")),
            credential("medium-key", Some("medium")),
            credential("heavy-key", Some("heavy")),
            credential("heavy-key-2", Some("heavy")),
        ],
        provider,
        store,
        clock,
        config,
    );

    let error = router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: Some(WorkloadTier::Light),
            conversation_id: None,
            estimated_tokens: 1,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap_err();

    // Not RateLimited, and not lumped in with a generic NonRecoverable
    // provider fault — distinguishable so a caller can apply the
    // safety-block recovery policy instead.
    assert!(matches!(error, RouterError::SafetyBlock));
}

#[tokio::test]
async fn non_recoverable_error_propagates_immediately() {
    let provider = FakeProviderAdapter::new();
    provider.push_response(Err(ProviderError::NonRecoverable("bad auth".to_string())));
    let router = router(vec![credential("k1", None)], provider);

    let error = router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: None,
            conversation_id: None,
            estimated_tokens: 1,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, RouterError::NonRecoverable(_)));
}

#[tokio::test]
async fn global_retry_cap_is_enforced() {
    let provider = FakeProviderAdapter::new();
    for _ in 0..5 {
        provider.push_response(Err(ProviderError::Transient("boom".to_string())));
    }
    let router = router(
        vec![
            credential("k1", None),
            credential("k2", None),
            credential("k3", None),
        ],
        provider,
    );

    let error = router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: None,
            conversation_id: None,
            estimated_tokens: 1,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, RouterError::RetriesExhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn successful_turn_is_persisted_to_conversation_history() {
    let provider = FakeProviderAdapter::new();
    provider.push_response(ok("assistant reply"));
    let router = router(vec![credential("k1", None)], provider);
    let conversation_id = ConversationId::new("c1");

    router
        .dispatch(RouterRequest {
            model_preference: None,
            workload_tier: None,
            conversation_id: Some(conversation_id.clone()),
            estimated_tokens: 10,
            prompt: "hi".to_string(),
        })
        .await
        .unwrap();

    let history = router.conversations.history(&conversation_id);
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "assistant reply");
}

#[tokio::test]
async fn dispatch_direct_bypasses_selection_and_reservation() {
    let provider = FakeProviderAdapter::new();
    provider.push_response(ok("direct"));
    let router = router(vec![credential("k1", None)], provider);

    let response = router
        .dispatch_direct(
            &KeyId::new("k1"),
            &ProviderRequest {
                model_tag: None,
                history: Vec::new(),
                prompt: "hi".to_string(),
                estimated_tokens: 1,
                safety: SafetySettings::default(),
            },
        )
        .await
        .unwrap();

    assert_eq!(response.content, "direct");
}
