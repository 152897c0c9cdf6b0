// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret scan run against every file before any write (spec §4.4 step 1).

use crate::error::ArtifactError;
use crate::types::ArtifactFile;
use regex::RegexSet;

const PATTERNS: &[&str] = &[
    r"AKIA[0-9A-Z]{16}",                                       // AWS access key id
    r"(?i)aws_secret_access_key\s*[:=]\s*['\x22]?[A-Za-z0-9/+=]{40}",
    r"sk-ant-[A-Za-z0-9_-]{20,}",                              // Anthropic key
    r"sk-[A-Za-z0-9]{20,}",                                    // OpenAI-style key
    r"gh[pousr]_[A-Za-z0-9]{20,}",                             // GitHub token
    r"xox[baprs]-[A-Za-z0-9-]{10,}",                           // Slack token
    r"-----BEGIN (RSA |EC |OPENSSH )?PRIVATE KEY-----",
    r#"(?i)(api[_-]?key|secret|token)\s*[:=]\s*['\x22][A-Za-z0-9_\-]{16,}['\x22]"#,
];

/// Compiled secret-detection rule set, applied to raw file bytes
/// (lossy-decoded) before anything is committed.
pub struct SecretScanner {
    patterns: RegexSet,
}

impl SecretScanner {
    pub fn new() -> Result<Self, ArtifactError> {
        Ok(Self {
            patterns: RegexSet::new(PATTERNS)?,
        })
    }

    /// Scan every file; fail closed on the first match, naming the
    /// offending file (spec §4.4 step 1).
    pub fn scan(&self, files: &[ArtifactFile]) -> Result<(), ArtifactError> {
        for file in files {
            let text = String::from_utf8_lossy(&file.contents);
            if self.patterns.is_match(&text) {
                return Err(ArtifactError::SecretDetected {
                    file: file.relative_path.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "secret_scan_tests.rs"]
mod tests;
