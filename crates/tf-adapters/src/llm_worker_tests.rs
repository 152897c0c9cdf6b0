// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tf_core::credential::{Credential, KeyId, ProviderTag};
use tf_core::graph::{Task, WorkerRole};
use tf_core::workflow::{CorrelationId, WorkflowId};
use tf_core::FakeClock;
use tf_ratelimit::InMemoryRateLimiterStore;
use tf_router::provider::{FakeProviderAdapter, ProviderError, ProviderResponse};
use tf_router::router::RouterConfig;

fn credential() -> Credential {
    Credential {
        key_id: KeyId::new("key-1"),
        provider_tag: ProviderTag::from("acme"),
        model_tag: None,
        workload_tag: None,
        rpm_limit: None,
        tpm_limit: None,
        daily_limit: None,
        active: true,
    }
}

fn task(role: WorkerRole) -> Task {
    Task {
        id: "t1".into(),
        title: "do it".to_string(),
        description: "write a function".to_string(),
        role,
        priority: 0,
        deps: Vec::new(),
        acceptance: Vec::new(),
        max_retries: 1,
        timeout: std::time::Duration::from_secs(600),
        parent_id: None,
        branch_reason: None,
        debug_depth: 0,
        failure_routing: Default::default(),
        metadata: Default::default(),
    }
}

fn request() -> DispatchRequest {
    DispatchRequest {
        correlation_id: CorrelationId::new("corr-1"),
        workflow_id: WorkflowId::new("wf-1"),
        task: task(WorkerRole::Implement),
        attempt: 1,
        parent_description: None,
        failure_class: None,
        fix_hint: None,
        input_artifacts: Vec::new(),
        fixtures: Vec::new(),
    }
}

fn adapter(
    provider: FakeProviderAdapter,
    output_root: &std::path::Path,
) -> LlmWorkerAdapter<FakeProviderAdapter, InMemoryRateLimiterStore<FakeClock>, FakeClock> {
    let clock = FakeClock::new(0);
    let rate_limiter = InMemoryRateLimiterStore::new(clock.clone());
    let router = CredentialRouter::new(
        vec![credential()],
        provider,
        rate_limiter,
        clock,
        RouterConfig::default(),
    );
    LlmWorkerAdapter::new(router, output_root)
}

#[tokio::test]
async fn successful_response_is_staged_as_an_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProviderAdapter::new();
    provider.push_response(Ok(ProviderResponse {
        content: "fn add(a: i32, b: i32) -> i32 { a + b }".to_string(),
        model_used: "acme-1".to_string(),
        tokens_used: 10,
    }));

    let adapter = adapter(provider, dir.path());
    let result = adapter.handle_dispatch(request()).await.unwrap();

    match result {
        Event::TaskCompleted { artifacts, .. } => {
            assert_eq!(artifacts.len(), 1);
            let contents = std::fs::read_to_string(&artifacts[0].path).unwrap();
            assert!(contents.contains("fn add"));
        }
        other => panic!("expected TaskCompleted, got {other:?}"),
    }
}

#[tokio::test]
async fn non_recoverable_provider_error_folds_into_task_failed() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProviderAdapter::new();
    provider.push_response(Err(ProviderError::NonRecoverable("bad key".to_string())));

    let adapter = adapter(provider, dir.path());
    let result = adapter.handle_dispatch(request()).await.unwrap();

    match result {
        Event::TaskFailed { failures, .. } => {
            assert!(failures[0].contains("non-recoverable"));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
}
