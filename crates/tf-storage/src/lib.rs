// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for the workflow engine: a JSONL write-ahead log of
//! [`tf_core::Event`]s, background zstd-compressed snapshots of the derived
//! [`MaterializedState`], and schema migration for snapshots written by an
//! older build (spec §4.6 "Persistence").

mod checkpoint;
mod migration;
mod snapshot;
mod state;
mod state_store;
mod wal;

/// Current on-disk snapshot schema version. Bump this and add a
/// [`migration::Migration`] to the registry when [`MaterializedState`]'s
/// shape changes in a way that isn't `#[serde(default)]`-compatible.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub use checkpoint::{
    load_snapshot, CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter,
    Checkpointer, FsCheckpointWriter,
};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use state_store::{FsStateStore, InMemoryStateStore, StateStoreError, WorkflowStateStore};
pub use wal::{Wal, WalEntry, WalError};
