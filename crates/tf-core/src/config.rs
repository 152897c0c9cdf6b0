// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide configuration surface (spec §6). Loaded once at startup from
//! TOML and passed by reference to the components that need it — no ambient
//! global state.

use serde::{Deserialize, Serialize};

/// `router.*` — credential router behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Route through the multi-key router vs a direct single-key provider.
    pub enabled: bool,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub default_cooldown_s: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            base_backoff_ms: 200,
            default_cooldown_s: 30,
        }
    }
}

/// `scheduler.*` — workflow scheduler behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub max_branch_depth: u32,
    pub worker_pool_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_branch_depth: 2,
            worker_pool_size: 4,
        }
    }
}

/// `sandbox.*` — resource caps applied to every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub mem_limit_mb: u64,
    pub cpu_limit: f64,
    pub timeout_s: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            mem_limit_mb: 1024,
            cpu_limit: 0.5,
            timeout_s: 600,
        }
    }
}

/// `artifact.*` — commit-time behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub auto_push: bool,
    pub branch_prefix: String,
    pub scan_secrets: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            auto_push: false,
            branch_prefix: "tf".to_string(),
            scan_secrets: true,
        }
    }
}

/// Transport selection for [`BusConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusTransport {
    InMemory,
    Remote,
}

impl Default for BusTransport {
    fn default() -> Self {
        BusTransport::InMemory
    }
}

/// `bus.*` — event bus transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub transport: BusTransport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

/// `conversation.*` — router conversation-history lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub ttl_s: u64,
    pub retention_messages: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            ttl_s: 3600,
            retention_messages: 50,
        }
    }
}

/// `storage.*` — durable state store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub wal_dir: std::path::PathBuf,
    pub checkpoint_interval_entries: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            wal_dir: std::path::PathBuf::from("./data/wal"),
            checkpoint_interval_entries: 500,
        }
    }
}

/// `log.*` — tracing subscriber behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_dir: Option<std::path::PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_dir: None,
        }
    }
}

/// Top-level process configuration (spec §6 "Configuration surface").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub router: RouterConfig,
    pub scheduler: SchedulerConfig,
    pub sandbox: SandboxConfig,
    pub artifact: ArtifactConfig,
    pub bus: BusConfig,
    pub conversation: ConversationConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl Config {
    /// Load from a TOML file on disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.as_ref().display().to_string(),
            source,
        })
    }
}

/// Errors loading configuration from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
