// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event bus (spec §4.1 "single-process variant").

use crate::error::BusError;
use crate::subscriber::Subscriber;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tf_core::{Channel, Envelope};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Opaque handle returned from `subscribe`, used to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    tx: mpsc::UnboundedSender<Envelope>,
    task: JoinHandle<()>,
}

/// Typed pub/sub bus over the fixed channel set (spec §4.1).
///
/// Each subscriber gets its own unbounded queue drained by a dedicated
/// task, which gives FIFO delivery per (channel, subscriber) and makes
/// publish non-blocking: `try_send`-equivalent `send` on an unbounded
/// channel never waits on a slow subscriber. A subscriber task panicking
/// while running a callback only aborts that task — it never touches the
/// publisher or other subscribers (exception isolation).
#[derive(Clone)]
pub struct InMemoryEventBus {
    channels: Arc<Mutex<HashMap<Channel, Vec<Subscription>>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Publish never fails for an unknown subscriber (spec §4.1); delivery
    /// to each current subscriber is queued and this returns immediately.
    pub fn publish(&self, channel: Channel, envelope: Envelope) {
        let mut channels = self.channels.lock();
        let subs = channels.entry(channel).or_default();
        subs.retain(|sub| sub.tx.send(envelope.clone()).is_ok());
    }

    /// Subscribe for an unknown channel creates it lazily (spec §4.1).
    pub fn subscribe(&self, channel: Channel, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let task = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                subscriber.on_event(envelope).await;
            }
        });
        self.channels
            .lock()
            .entry(channel)
            .or_default()
            .push(Subscription { id, tx, task });
        id
    }

    pub fn unsubscribe(&self, channel: Channel, id: SubscriptionId) {
        let mut channels = self.channels.lock();
        if let Some(subs) = channels.get_mut(&channel) {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                let sub = subs.remove(pos);
                sub.task.abort();
            }
        }
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.channels
            .lock()
            .get(&channel)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide event bus interface, implemented by both backends (spec
/// §4.1 "both expose the same interface").
#[async_trait::async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, channel: Channel, envelope: Envelope) -> Result<(), BusError>;
    fn subscribe(&self, channel: Channel, subscriber: Arc<dyn Subscriber>) -> SubscriptionId;
}

#[async_trait::async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, channel: Channel, envelope: Envelope) -> Result<(), BusError> {
        InMemoryEventBus::publish(self, channel, envelope);
        Ok(())
    }

    fn subscribe(&self, channel: Channel, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        InMemoryEventBus::subscribe(self, channel, subscriber)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
