// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router-level errors (spec §4.3).

use thiserror::Error;

/// Failure returned by [`crate::CredentialRouter::dispatch`].
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// No credential satisfies the selection filters. Carries the earliest
    /// epoch-ms at which a currently-cooling-down candidate becomes
    /// eligible again, if any such candidate exists.
    #[error("no credential available (earliest retry at {earliest_retry_ms:?})")]
    NoKeyAvailable { earliest_retry_ms: Option<u64> },

    /// The global retry cap was reached without a successful attempt.
    #[error("all {attempts} attempt(s) exhausted: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// A provider error that must not be retried.
    #[error("non-recoverable provider error: {0}")]
    NonRecoverable(String),

    /// Content-safety rejection that persisted after prompt softening and
    /// tier escalation (spec §7 `safety-block`, §8 scenario 5: "error class
    /// returned is `safety-block`, not `rate-limited`"). Distinct from
    /// [`RouterError::NonRecoverable`] so callers can apply the taxonomy's
    /// safety-block recovery instead of treating it as a generic provider
    /// fault.
    #[error("content safety rejection persisted after softening")]
    SafetyBlock,
}
