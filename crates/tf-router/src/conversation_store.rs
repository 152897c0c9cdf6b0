// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router-owned conversation history (spec §4.3 "owns conversation
//! history"), keyed by [`ConversationId`] with idle-TTL eviction.

use parking_lot::Mutex;
use std::collections::HashMap;
use tf_core::{Clock, Conversation, ConversationId, Message};

/// In-process conversation history store. One router owns one of these;
/// entries older than `ttl_ms` are dropped lazily on next access.
pub struct ConversationStore<C> {
    clock: C,
    ttl_ms: u64,
    inner: Mutex<HashMap<String, Conversation>>,
}

impl<C: Clock> ConversationStore<C> {
    pub fn new(clock: C, ttl_ms: u64) -> Self {
        Self {
            clock,
            ttl_ms,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Prior turns for `id`, empty if the conversation doesn't exist or has
    /// expired.
    pub fn history(&self, id: &ConversationId) -> Vec<Message> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        self.evict_expired_locked(&mut inner, now);
        inner
            .get(id.as_str())
            .map(|c| c.history.clone())
            .unwrap_or_default()
    }

    /// Append a user/assistant turn, creating the conversation if it
    /// doesn't exist yet. Called only after a successful dispatch
    /// (spec §4.3 step 4).
    pub fn append_turn(&self, id: &ConversationId, user: Message, assistant: Message) {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        self.evict_expired_locked(&mut inner, now);
        let conversation = inner
            .entry(id.as_str().to_string())
            .or_insert_with(|| Conversation::new(id.clone(), now));
        conversation.push(user, now);
        conversation.push(assistant, now);
    }

    /// Explicit sweep, useful for background maintenance tasks independent
    /// of request traffic.
    pub fn evict_expired(&self) {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        self.evict_expired_locked(&mut inner, now);
    }

    fn evict_expired_locked(&self, inner: &mut HashMap<String, Conversation>, now: u64) {
        inner.retain(|_, c| !c.is_expired(now, self.ttl_ms));
    }
}

#[cfg(test)]
#[path = "conversation_store_tests.rs"]
mod tests;
