// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation: per-task message history kept by the credential router so
//! retries and repairs can continue a multi-turn exchange with the same
//! provider key (spec §3, §4.3 "conversation affinity").

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a router-managed conversation.
    #[derive(Default)]
    pub struct ConversationId;
}

/// Speaker of a single message in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub tokens_estimate: u32,
}

/// Router-side conversation state (spec §3, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub created_at_ms: u64,
    pub last_active_ms: u64,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub total_tokens_estimate: u64,
    #[serde(default)]
    pub history: Vec<Message>,
}

impl Conversation {
    pub fn new(conversation_id: ConversationId, now_ms: u64) -> Self {
        Self {
            conversation_id,
            created_at_ms: now_ms,
            last_active_ms: now_ms,
            message_count: 0,
            total_tokens_estimate: 0,
            history: Vec::new(),
        }
    }

    /// Append a turn and bump the rolling counters (spec §4.3).
    pub fn push(&mut self, message: Message, now_ms: u64) {
        self.total_tokens_estimate += message.tokens_estimate as u64;
        self.message_count += 1;
        self.history.push(message);
        self.last_active_ms = now_ms;
    }

    /// Whether this conversation has been idle longer than `ttl_ms` and is
    /// eligible for eviction (spec §4.3 "idle conversations are evicted").
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_active_ms) >= ttl_ms
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
