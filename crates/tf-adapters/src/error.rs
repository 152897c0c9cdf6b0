// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter-level errors (spec §4.6 "Worker Adapters", §9 "Dynamic dispatch").

use thiserror::Error;
use tf_core::graph::WorkerRole;

/// Failure a [`crate::worker::WorkerAdapter`] or
/// [`crate::plan::PlanProducer`] cannot fold into an ordinary result event.
///
/// Everything a worker can classify against the spec §7 taxonomy (a failed
/// test, a rejected artifact, a sandbox timeout) comes back as `Ok(Event)`
/// instead — this type is reserved for the adapter layer itself being
/// unable to produce a result at all.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// No adapter is registered for this role.
    #[error("no worker adapter registered for role {0}")]
    RoleNotRegistered(WorkerRole),

    /// The router or sandbox gateway this adapter wraps failed in a way
    /// that is not locally recoverable (spec §7 `non-recoverable`).
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// A plan producer rejected or could not parse the request it was
    /// given. Carries the producer's own message.
    #[error("plan producer rejected request: {0}")]
    PlanRejected(String),
}
