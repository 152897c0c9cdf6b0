// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role registry: tag -> adapter, the dynamic-dispatch mechanism spec §9
//! asks for in place of reflection.

use crate::dispatch::DispatchRequest;
use crate::error::AdapterError;
use crate::worker::WorkerAdapter;
use std::collections::HashMap;
use std::sync::Arc;
use tf_core::event::Event;
use tf_core::graph::WorkerRole;

/// Maps each [`WorkerRole`] tag on a task graph to the adapter that
/// services it. Built once per scheduler and shared across dispatches.
#[derive(Default, Clone)]
pub struct RoleRegistry {
    adapters: HashMap<WorkerRole, Arc<dyn WorkerAdapter>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the adapter servicing `role`.
    pub fn register(&mut self, role: WorkerRole, adapter: Arc<dyn WorkerAdapter>) -> &mut Self {
        self.adapters.insert(role, adapter);
        self
    }

    pub fn is_registered(&self, role: WorkerRole) -> bool {
        self.adapters.contains_key(&role)
    }

    /// Dispatch to whichever adapter services `request`'s role.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<Event, AdapterError> {
        let role = request.role();
        match self.adapters.get(&role) {
            Some(adapter) => adapter.handle_dispatch(request).await,
            None => Err(AdapterError::RoleNotRegistered(role)),
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
