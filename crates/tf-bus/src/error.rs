// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Errors surfaced to a publisher. Publish never fails for an unknown
/// subscriber (spec §4.1 "Failure semantics") — these are transport faults.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("remote transport error publishing to {channel}: {source}")]
    Transport {
        channel: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
