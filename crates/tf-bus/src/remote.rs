// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote event bus variant (spec §4.1 "a remote variant backed by a
//! publish/subscribe transport"). The wire protocol of the actual
//! transport (Redis, NATS, a message queue) is a deployment concern and
//! is abstracted behind [`PubSubTransport`] — the same seam the router
//! uses for provider adapters and the sandbox uses for container runners.

use crate::bus::{EventBus, SubscriptionId};
use crate::error::BusError;
use crate::subscriber::Subscriber;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tf_core::{Channel, Envelope};

/// External collaborator: an actual publish/subscribe wire transport.
/// Implementations own their own connection pooling and retries.
#[async_trait::async_trait]
pub trait PubSubTransport: Send + Sync {
    async fn publish(&self, channel: Channel, envelope: &Envelope) -> Result<(), BusError>;

    /// Register a callback to be invoked for every message the transport
    /// delivers on `channel`. Returns an opaque subscription handle.
    fn subscribe(&self, channel: Channel, subscriber: Arc<dyn Subscriber>) -> SubscriptionId;
}

/// Bus variant that forwards publish/subscribe calls to a configured
/// [`PubSubTransport`] (spec §4.1 "Transport errors in the remote variant
/// are surfaced to the publisher and logged").
pub struct RemoteEventBus {
    transport: Arc<dyn PubSubTransport>,
}

impl RemoteEventBus {
    pub fn new(transport: Arc<dyn PubSubTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl EventBus for RemoteEventBus {
    async fn publish(&self, channel: Channel, envelope: Envelope) -> Result<(), BusError> {
        match self.transport.publish(channel, &envelope).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::error!(channel = %channel, error = %err, "remote bus publish failed");
                Err(err)
            }
        }
    }

    fn subscribe(&self, channel: Channel, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        self.transport.subscribe(channel, subscriber)
    }
}

/// In-memory stand-in for a real wire transport, exposed for tests that
/// exercise [`RemoteEventBus`] without a live broker.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeTransport {
    inner: crate::bus::InMemoryEventBus,
    next_id: AtomicU64,
    fail_next: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeTransport {
    pub fn new() -> Self {
        Self {
            inner: crate::bus::InMemoryEventBus::new(),
            next_id: AtomicU64::new(1),
            fail_next: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Make the next `publish` call return a transport error.
    pub fn fail_next_publish(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait::async_trait]
impl PubSubTransport for FakeTransport {
    async fn publish(&self, channel: Channel, envelope: &Envelope) -> Result<(), BusError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BusError::Transport {
                channel: channel.to_string(),
                source: "simulated transport failure".into(),
            });
        }
        let _ = self.next_id.load(Ordering::Relaxed);
        self.inner.publish(channel, envelope.clone());
        Ok(())
    }

    fn subscribe(&self, channel: Channel, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        self.inner.subscribe(channel, subscriber)
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
