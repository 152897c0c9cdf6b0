// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential: a single routable provider key with its rate budget
//! (spec §3, §4.3).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a configured credential / provider key.
    #[derive(Default)]
    pub struct KeyId;
}

/// Tag identifying which upstream provider a credential routes to.
/// Opaque to the router — comparison and hashing only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderTag(pub String);

impl std::fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProviderTag {
    fn from(s: &str) -> Self {
        ProviderTag(s.to_string())
    }
}

/// Workload-class tag used to prefer keys provisioned for a given task role
/// (spec §4.3 "credential selection").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadTag(pub String);

impl From<&str> for WorkloadTag {
    fn from(s: &str) -> Self {
        WorkloadTag(s.to_string())
    }
}

/// A single provider credential and its static rate budget (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub key_id: KeyId,
    pub provider_tag: ProviderTag,
    #[serde(default)]
    pub model_tag: Option<String>,
    #[serde(default)]
    pub workload_tag: Option<WorkloadTag>,
    /// Requests-per-minute ceiling, if the provider enforces one.
    #[serde(default)]
    pub rpm_limit: Option<u32>,
    /// Tokens-per-minute ceiling, if the provider enforces one.
    #[serde(default)]
    pub tpm_limit: Option<u32>,
    /// Daily request ceiling, if configured.
    #[serde(default)]
    pub daily_limit: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Credential {
    /// Whether this credential is eligible to serve a request for the given
    /// workload tag. A credential with no workload tag serves everything
    /// (spec §4.3: "untagged keys are the fallback pool").
    pub fn matches_workload(&self, wanted: Option<&WorkloadTag>) -> bool {
        match (&self.workload_tag, wanted) {
            (None, _) => true,
            (Some(have), Some(want)) => have == want,
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
