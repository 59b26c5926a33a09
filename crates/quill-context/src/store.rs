// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message store for a single conversation.
//!
//! Insertion order is chronological order; messages are never reordered or
//! removed after append. Reclassifying a message's memory state changes its
//! inclusion in future built contexts without touching the transcript.

use quill_core::types::{CompletionResponse, MemoryState, Message, MessageId, TurnPayload};

/// A message to append, with generated fields left optional.
///
/// `id` and `created_at` are assigned at append time when absent. Assistant
/// drafts default their id to the server-assigned completion id so callers
/// can read it back from the stored message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: Option<MessageId>,
    pub created_at: Option<i64>,
    pub memory_state: Option<MemoryState>,
    pub payload: TurnPayload,
}

impl NewMessage {
    /// A plain user turn. Context artifacts are attached by the conversation
    /// before append.
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            id: None,
            created_at: None,
            memory_state: None,
            payload: TurnPayload::User {
                prompt: prompt.into(),
                context: None,
                full_text: None,
                turns: Vec::new(),
            },
        }
    }

    /// An assistant turn wrapping a provider response.
    pub fn assistant(response: CompletionResponse) -> Self {
        let id = if response.id.is_empty() {
            None
        } else {
            Some(MessageId(response.id.clone()))
        };
        Self {
            id,
            created_at: None,
            memory_state: None,
            payload: TurnPayload::Assistant { response },
        }
    }

    /// A synthetic system record. Always classified `MemoryState::System`.
    pub fn system(output: impl Into<String>) -> Self {
        Self {
            id: None,
            created_at: None,
            memory_state: Some(MemoryState::System),
            payload: TurnPayload::System {
                output: output.into(),
            },
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_memory_state(mut self, state: MemoryState) -> Self {
        self.memory_state = Some(state);
        self
    }
}

/// Append-only ordered sequence of messages belonging to one conversation.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, assigning generated fields when absent, and
    /// returns the stored message.
    pub fn append(&mut self, new: NewMessage) -> &Message {
        let memory_state = new.memory_state.unwrap_or(match new.payload {
            TurnPayload::System { .. } => MemoryState::System,
            _ => MemoryState::Default,
        });
        let message = Message {
            id: new
                .id
                .unwrap_or_else(|| MessageId(uuid::Uuid::new_v4().to_string())),
            created_at: new
                .created_at
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
            memory_state,
            payload: new.payload,
        };
        self.messages.push(message);
        self.messages
            .last()
            .expect("store is non-empty after push")
    }

    /// Returns messages whose memory state is in `states`, preserving
    /// original order.
    pub fn filter_by_memory_state(&self, states: &[MemoryState]) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| states.contains(&m.memory_state))
            .collect()
    }

    /// Reclassifies a message. Idempotent: returns `false` when the message
    /// is missing or already in the requested state.
    pub fn set_memory_state(&mut self, id: &MessageId, state: MemoryState) -> bool {
        match self.messages.iter_mut().find(|m| &m.id == id) {
            Some(message) if message.memory_state != state => {
                tracing::debug!(
                    message_id = %id,
                    from = %message.memory_state,
                    to = %state,
                    "memory state changed"
                );
                message.memory_state = state;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::types::TokenUsage;

    fn response(id: &str, content: &str) -> CompletionResponse {
        CompletionResponse {
            id: id.into(),
            model: "gpt-3.5-turbo".into(),
            content: content.into(),
            finish_reason: Some("stop".into()),
            usage: Some(TokenUsage::default()),
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn append_assigns_generated_fields() {
        let mut store = MessageStore::new();
        let msg = store.append(NewMessage::user("hello"));
        assert!(!msg.id.0.is_empty());
        assert!(msg.created_at > 0);
        assert_eq!(msg.memory_state, MemoryState::Default);
    }

    #[test]
    fn append_keeps_explicit_fields() {
        let mut store = MessageStore::new();
        let msg = store.append(
            NewMessage::user("hello")
                .with_id(MessageId("m-1".into()))
                .with_created_at(42)
                .with_memory_state(MemoryState::Core),
        );
        assert_eq!(msg.id.0, "m-1");
        assert_eq!(msg.created_at, 42);
        assert_eq!(msg.memory_state, MemoryState::Core);
    }

    #[test]
    fn assistant_append_reads_back_server_id() {
        let mut store = MessageStore::new();
        let msg = store.append(NewMessage::assistant(response("cmpl-99", "hi")));
        assert_eq!(msg.id.0, "cmpl-99");
    }

    #[test]
    fn system_messages_default_to_system_state() {
        let mut store = MessageStore::new();
        let msg = store.append(NewMessage::system("error: timeout"));
        assert_eq!(msg.memory_state, MemoryState::System);
    }

    #[test]
    fn filter_preserves_insertion_order() {
        let mut store = MessageStore::new();
        store.append(NewMessage::user("a").with_created_at(1));
        store.append(NewMessage::user("b").with_created_at(2).with_memory_state(MemoryState::Core));
        store.append(NewMessage::user("c").with_created_at(3));

        let filtered = store.filter_by_memory_state(&[MemoryState::Default, MemoryState::Core]);
        let contents: Vec<_> = filtered.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn set_memory_state_is_idempotent() {
        let mut store = MessageStore::new();
        let id = store.append(NewMessage::user("a")).id.clone();

        assert!(store.set_memory_state(&id, MemoryState::Forgotten));
        assert!(!store.set_memory_state(&id, MemoryState::Forgotten));
        assert_eq!(store.get(&id).unwrap().memory_state, MemoryState::Forgotten);

        let missing = MessageId("nope".into());
        assert!(!store.set_memory_state(&missing, MemoryState::Core));
    }

    #[test]
    fn forgetting_keeps_the_transcript_intact() {
        let mut store = MessageStore::new();
        let id = store.append(NewMessage::user("secret")).id.clone();
        store.set_memory_state(&id, MemoryState::Forgotten);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().content(), "secret");
        assert!(store
            .filter_by_memory_state(&[MemoryState::Default, MemoryState::Core, MemoryState::Remembered])
            .is_empty());
    }
}
