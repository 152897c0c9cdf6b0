// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tf-bus: typed pub/sub over the fixed set of named channels (spec §4.1).
//!
//! Exposes the same [`EventBus`] interface over two backends: an in-process
//! broadcast implementation and a remote variant that delegates to an
//! injected [`PubSubTransport`]. Selection is a configuration switch, not a
//! type-level choice, so callers hold a `Arc<dyn EventBus>`.

pub mod bus;
pub mod error;
pub mod remote;
pub mod subscriber;

pub use bus::{EventBus, InMemoryEventBus, SubscriptionId};
pub use error::BusError;
pub use remote::{PubSubTransport, RemoteEventBus};
pub use subscriber::Subscriber;
