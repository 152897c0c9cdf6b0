// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tf_core::KeyId;

fn credential(key: &str) -> Credential {
    Credential {
        key_id: KeyId::new(key),
        provider_tag: "anthropic".into(),
        model_tag: None,
        workload_tag: None,
        rpm_limit: None,
        tpm_limit: None,
        daily_limit: None,
        active: true,
    }
}

fn request(prompt: &str) -> ProviderRequest {
    ProviderRequest {
        model_tag: None,
        history: Vec::new(),
        prompt: prompt.to_string(),
        estimated_tokens: 10,
        safety: SafetySettings::default(),
    }
}

#[tokio::test]
async fn returns_scripted_responses_in_order() {
    let fake = FakeProviderAdapter::new();
    fake.push_response(Ok(ProviderResponse {
        content: "first".to_string(),
        model_used: "m1".to_string(),
        tokens_used: 5,
    }));
    fake.push_response(Err(ProviderError::RateLimit {
        retry_after_ms: Some(1_000),
    }));

    let first = fake.send(&credential("k1"), &request("hi")).await.unwrap();
    assert_eq!(first.content, "first");

    let second = fake.send(&credential("k1"), &request("hi again")).await;
    assert!(matches!(second, Err(ProviderError::RateLimit { .. })));
}

#[tokio::test]
async fn missing_scripted_response_is_non_recoverable() {
    let fake = FakeProviderAdapter::new();
    let result = fake.send(&credential("k1"), &request("hi")).await;
    assert!(matches!(result, Err(ProviderError::NonRecoverable(_))));
}

#[tokio::test]
async fn records_every_call() {
    let fake = FakeProviderAdapter::new();
    fake.push_response(Ok(ProviderResponse {
        content: "ok".to_string(),
        model_used: "m1".to_string(),
        tokens_used: 1,
    }));
    fake.send(&credential("k1"), &request("hello")).await.ok();

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].key_id.as_str(), "k1");
    assert_eq!(calls[0].prompt, "hello");
}
