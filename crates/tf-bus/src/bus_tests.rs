// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex as StdMutex;
use tf_core::{CorrelationId, Envelope, EventId, WorkflowId};

fn envelope(n: u64) -> Envelope {
    Envelope::new(
        EventId::new(format!("e{n}")),
        CorrelationId::new("c1"),
        "test",
        n,
        tf_core::Event::WorkflowRunning {
            workflow_id: WorkflowId::new("w1"),
        },
    )
}

struct Recorder(Arc<StdMutex<Vec<u64>>>);

#[async_trait::async_trait]
impl Subscriber for Recorder {
    async fn on_event(&self, envelope: Envelope) {
        self.0.lock().push(envelope.timestamp_ms);
    }
}

#[tokio::test]
async fn subscribe_creates_channel_lazily() {
    let bus = InMemoryEventBus::new();
    assert_eq!(bus.subscriber_count(Channel::Requests), 0);
    let received = Arc::new(StdMutex::new(Vec::new()));
    bus.subscribe(Channel::Requests, Arc::new(Recorder(received)));
    assert_eq!(bus.subscriber_count(Channel::Requests), 1);
}

#[tokio::test]
async fn publish_without_subscribers_does_not_fail() {
    let bus = InMemoryEventBus::new();
    bus.publish(Channel::Requests, envelope(1));
}

#[tokio::test]
async fn delivers_fifo_to_each_subscriber() {
    let bus = InMemoryEventBus::new();
    let received = Arc::new(StdMutex::new(Vec::new()));
    bus.subscribe(Channel::Requests, Arc::new(Recorder(Arc::clone(&received))));

    for i in 0..5 {
        bus.publish(Channel::Requests, envelope(i));
    }
    // Give the drain task a chance to run.
    tokio::task::yield_now().await;
    for _ in 0..20 {
        if received.lock().len() == 5 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(*received.lock(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn each_subscriber_gets_every_event() {
    let bus = InMemoryEventBus::new();
    let a = Arc::new(StdMutex::new(Vec::new()));
    let b = Arc::new(StdMutex::new(Vec::new()));
    bus.subscribe(Channel::Results, Arc::new(Recorder(Arc::clone(&a))));
    bus.subscribe(Channel::Results, Arc::new(Recorder(Arc::clone(&b))));

    bus.publish(Channel::Results, envelope(42));
    for _ in 0..20 {
        if a.lock().len() == 1 && b.lock().len() == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(*a.lock(), vec![42]);
    assert_eq!(*b.lock(), vec![42]);
}

#[tokio::test]
async fn unsubscribe_stops_further_delivery() {
    let bus = InMemoryEventBus::new();
    let received = Arc::new(StdMutex::new(Vec::new()));
    let id = bus.subscribe(Channel::Audit, Arc::new(Recorder(Arc::clone(&received))));
    bus.unsubscribe(Channel::Audit, id);
    assert_eq!(bus.subscriber_count(Channel::Audit), 0);
    bus.publish(Channel::Audit, envelope(1));
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(received.lock().is_empty());
}

#[tokio::test]
async fn independent_channels_do_not_cross_deliver() {
    let bus = InMemoryEventBus::new();
    let received = Arc::new(StdMutex::new(Vec::new()));
    bus.subscribe(Channel::Approvals, Arc::new(Recorder(Arc::clone(&received))));
    bus.publish(Channel::Audit, envelope(1));
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(received.lock().is_empty());
}
