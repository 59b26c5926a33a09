// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded registry of open conversations.
//!
//! Conversations are shared as `Arc<Mutex<Conversation>>` so the session can
//! stream into one while the host reads others. The registry holds at most
//! `capacity` conversations, evicting the least recently used; the current
//! conversation is never evicted.

use std::sync::Arc;

use quill_core::types::ConversationId;
use quill_core::QuillError;
use tokio::sync::Mutex;

use crate::conversation::{Conversation, ConversationSettings};

pub type SharedConversation = Arc<Mutex<Conversation>>;

pub struct ConversationRegistry {
    capacity: usize,
    /// Recency order: front is least recently used.
    entries: Vec<(ConversationId, SharedConversation)>,
    current: Option<ConversationId>,
}

impl ConversationRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
            current: None,
        }
    }

    /// Creates a conversation, registers it, and makes it current.
    pub fn start_conversation(
        &mut self,
        model: &str,
        preamble: &str,
        title: Option<&str>,
        settings: ConversationSettings,
    ) -> Result<SharedConversation, QuillError> {
        let mut conversation = Conversation::with_model_id(model, settings)?;
        conversation.set_preamble(preamble);
        if let Some(title) = title {
            conversation.set_title(title);
        }
        let id = conversation.id().clone();
        let shared = self.insert(conversation);
        self.current = Some(id.clone());
        tracing::info!(conversation = %id, model, "conversation started");
        Ok(shared)
    }

    /// Renames a registered conversation. Returns `false` when it is not
    /// registered or the title is unchanged.
    pub async fn update_title(&mut self, id: &ConversationId, title: &str) -> bool {
        match self.get(id) {
            Some(shared) => shared.lock().await.set_title(title),
            None => false,
        }
    }

    /// Registers a conversation, evicting the least recently used entry when
    /// over capacity, and returns the shared handle.
    pub fn insert(&mut self, conversation: Conversation) -> SharedConversation {
        let id = conversation.id().clone();
        let shared: SharedConversation = Arc::new(Mutex::new(conversation));
        self.entries.push((id, shared.clone()));
        self.evict_over_capacity();
        shared
    }

    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(pos) = self
                .entries
                .iter()
                .position(|(id, _)| Some(id) != self.current.as_ref())
            else {
                break;
            };
            let (id, _) = self.entries.remove(pos);
            tracing::debug!(conversation = %id, "evicted least recently used conversation");
        }
    }

    /// Looks up a conversation and marks it most recently used.
    pub fn get(&mut self, id: &ConversationId) -> Option<SharedConversation> {
        let pos = self.entries.iter().position(|(entry, _)| entry == id)?;
        let entry = self.entries.remove(pos);
        let shared = entry.1.clone();
        self.entries.push(entry);
        Some(shared)
    }

    /// Looks up a conversation without touching recency.
    pub fn peek(&self, id: &ConversationId) -> Option<SharedConversation> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, shared)| shared.clone())
    }

    /// Makes `id` the current conversation. Returns `false` when it is not
    /// registered.
    pub fn set_current(&mut self, id: &ConversationId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.current = Some(id.clone());
        true
    }

    pub fn current_id(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<SharedConversation> {
        self.current.as_ref().and_then(|id| self.peek(id))
    }

    /// Removes a conversation, clearing the current marker when it pointed
    /// at it.
    pub fn remove(&mut self, id: &ConversationId) -> Option<SharedConversation> {
        let pos = self.entries.iter().position(|(entry, _)| entry == id)?;
        if self.current.as_ref() == Some(id) {
            self.current = None;
        }
        Some(self.entries.remove(pos).1)
    }

    /// Registered ids in recency order, least recently used first.
    pub fn ids(&self) -> Vec<&ConversationId> {
        self.entries.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
