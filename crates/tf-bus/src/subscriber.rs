// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use tf_core::Envelope;

/// A callback bound to a channel (spec §4.1 "Subscribers register a
/// callback bound to a channel"). Implementations must not panic across
/// await points they don't control; a panic inside `on_event` only aborts
/// that subscriber's delivery task, never the bus (exception isolation).
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn on_event(&self, envelope: Envelope);
}

#[async_trait]
impl<F> Subscriber for F
where
    F: Fn(Envelope) + Send + Sync,
{
    async fn on_event(&self, envelope: Envelope) {
        (self)(envelope)
    }
}
