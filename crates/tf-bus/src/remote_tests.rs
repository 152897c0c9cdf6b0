// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex as StdMutex;
use tf_core::{CorrelationId, Envelope, EventId, WorkflowId};

fn envelope() -> Envelope {
    Envelope::new(
        EventId::new("e1"),
        CorrelationId::new("c1"),
        "test",
        0,
        tf_core::Event::WorkflowRunning {
            workflow_id: WorkflowId::new("w1"),
        },
    )
}

struct Recorder(Arc<StdMutex<u32>>);

#[async_trait::async_trait]
impl Subscriber for Recorder {
    async fn on_event(&self, _envelope: Envelope) {
        *self.0.lock() += 1;
    }
}

#[tokio::test]
async fn publish_succeeds_through_fake_transport() {
    let transport = Arc::new(FakeTransport::new());
    let bus = RemoteEventBus::new(transport);
    assert!(bus.publish(Channel::Requests, envelope()).await.is_ok());
}

#[tokio::test]
async fn transport_failure_surfaces_to_caller() {
    let transport = Arc::new(FakeTransport::new());
    transport.fail_next_publish();
    let bus = RemoteEventBus::new(transport);
    let err = bus.publish(Channel::Requests, envelope()).await.unwrap_err();
    assert!(matches!(err, BusError::Transport { .. }));
}

#[tokio::test]
async fn subscription_receives_events_published_through_the_bus() {
    let transport = Arc::new(FakeTransport::new());
    let bus = RemoteEventBus::new(transport);
    let count = Arc::new(StdMutex::new(0));
    bus.subscribe(Channel::Requests, Arc::new(Recorder(Arc::clone(&count))));
    bus.publish(Channel::Requests, envelope()).await.unwrap();
    for _ in 0..20 {
        if *count.lock() == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(*count.lock(), 1);
}
