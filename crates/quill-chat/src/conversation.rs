// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A single conversation: identity, title, preamble, model binding,
//! per-conversation settings, and the message transcript.

use quill_config::model::ChatConfig;
use quill_core::models::{self, ModelDefinition};
use quill_core::types::{
    CompletionRequest, CompletionResponse, ConversationId, MemoryState, Message, MessageId,
    RequestPayload, TurnPayload,
};
use quill_core::QuillError;
use quill_context::{
    BuildSettings, BuiltContext, ContextBuilder, ContextPayload, MessageStore, NewMessage, NewTurn,
};

/// Title assigned to conversations until the user renames them. Transcripts
/// are not saved under this sentinel.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Per-conversation sampling and context settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub response_tokens: u32,
    /// Cap on non-core memories in the built context; 0 means unlimited.
    pub max_memory_count: usize,
    pub user_handle: String,
    pub bot_handle: String,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

impl ConversationSettings {
    pub fn from_config(chat: &ChatConfig) -> Self {
        Self {
            temperature: chat.temperature,
            top_p: chat.top_p,
            frequency_penalty: chat.frequency_penalty,
            presence_penalty: chat.presence_penalty,
            response_tokens: chat.response_tokens,
            max_memory_count: chat.max_memory_count,
            user_handle: chat.user_handle.clone(),
            bot_handle: chat.bot_handle.clone(),
        }
    }
}

/// A freshly appended user turn plus the context built for it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTurn {
    pub id: MessageId,
    pub context: BuiltContext,
}

/// A context-built user turn that has not been appended yet.
///
/// Drafts carry the id and timestamp the turn will be stored under, so the
/// rendered turn list and the eventual message agree. A caller that never
/// commits the draft leaves the transcript untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    id: MessageId,
    prompt: String,
    created_at: i64,
    pub context: BuiltContext,
}

impl UserDraft {
    pub fn id(&self) -> &MessageId {
        &self.id
    }
}

/// One conversation and its transcript.
#[derive(Debug)]
pub struct Conversation {
    id: ConversationId,
    title: String,
    preamble: String,
    model: &'static ModelDefinition,
    settings: ConversationSettings,
    store: MessageStore,
    created_at: i64,
}

impl Conversation {
    pub fn new(model: &'static ModelDefinition, settings: ConversationSettings) -> Self {
        Self {
            id: ConversationId(uuid::Uuid::new_v4().to_string()),
            title: DEFAULT_TITLE.to_string(),
            preamble: String::new(),
            model,
            settings,
            store: MessageStore::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Creates a conversation bound to a model looked up by API id.
    pub fn with_model_id(model: &str, settings: ConversationSettings) -> Result<Self, QuillError> {
        Ok(Self::new(models::get(model)?, settings))
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn model(&self) -> &'static ModelDefinition {
        self.model
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ConversationSettings {
        &mut self.settings
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Renames the conversation. Returns `false` when the title is unchanged.
    pub fn set_title(&mut self, title: &str) -> bool {
        if self.title == title {
            return false;
        }
        tracing::debug!(conversation = %self.id, title, "conversation renamed");
        self.title = title.to_string();
        true
    }

    /// Replaces the preamble. Returns `false` when unchanged.
    pub fn set_preamble(&mut self, preamble: &str) -> bool {
        if self.preamble == preamble {
            return false;
        }
        self.preamble = preamble.to_string();
        true
    }

    /// Rebinds the conversation to another supported model. Returns `false`
    /// when the model is unchanged.
    pub fn set_model(&mut self, model: &str) -> Result<bool, QuillError> {
        let definition = models::get(model)?;
        if std::ptr::eq(definition, self.model) {
            return Ok(false);
        }
        self.model = definition;
        Ok(true)
    }

    /// Replaces the settings wholesale. Returns `false` when unchanged.
    pub fn set_settings(&mut self, settings: ConversationSettings) -> bool {
        if self.settings == settings {
            return false;
        }
        self.settings = settings;
        true
    }

    /// Reclassifies a message's memory state. Returns `false` when the
    /// message is missing or already in that state.
    pub fn set_memory_state(&mut self, id: &MessageId, state: MemoryState) -> bool {
        self.store.set_memory_state(id, state)
    }

    /// Messages the user has explicitly pinned into context.
    pub fn memories(&self) -> Vec<&Message> {
        self.store
            .filter_by_memory_state(&[MemoryState::Core, MemoryState::Remembered])
    }

    /// Number of messages currently in `state`.
    pub fn memory_count(&self, state: MemoryState) -> usize {
        self.store.filter_by_memory_state(&[state]).len()
    }

    /// Total pinned memories (core plus remembered).
    pub fn total_memories(&self) -> usize {
        self.memories().len()
    }

    /// Builds the outgoing context for a draft prompt without appending
    /// anything. Used by hosts to preview token usage as the user types.
    pub fn build_context(&self, prompt: &str) -> Result<BuiltContext, QuillError> {
        self.build_context_for(
            prompt,
            &uuid::Uuid::new_v4().to_string(),
            chrono::Utc::now().timestamp(),
        )
    }

    fn build_context_for(
        &self,
        prompt: &str,
        turn_id: &str,
        created_at: i64,
    ) -> Result<BuiltContext, QuillError> {
        let builder = ContextBuilder::new(
            self.model,
            self.preamble.clone(),
            self.created_at,
            BuildSettings {
                user_handle: self.settings.user_handle.clone(),
                bot_handle: self.settings.bot_handle.clone(),
                max_memory_count: self.settings.max_memory_count,
                response_tokens: self.settings.response_tokens,
            },
        );
        builder.build(
            &self.store,
            NewTurn {
                id: turn_id,
                prompt,
                created_at,
            },
        )
    }

    /// Builds the context for a user turn without appending it.
    ///
    /// When building fails (for instance with
    /// [`QuillError::ContextTooLarge`]) nothing is appended; when the caller
    /// drops the draft instead of committing it, the store is unchanged.
    pub fn draft_user_message(&self, prompt: &str) -> Result<UserDraft, QuillError> {
        let id = MessageId(uuid::Uuid::new_v4().to_string());
        let created_at = chrono::Utc::now().timestamp();
        let context = self.build_context_for(prompt, &id.0, created_at)?;
        Ok(UserDraft {
            id,
            prompt: prompt.to_string(),
            created_at,
            context,
        })
    }

    /// Appends a drafted user turn with its context artifacts attached.
    pub fn commit_user_message(&mut self, draft: UserDraft) -> UserTurn {
        let (full_text, turns) = match &draft.context.payload {
            ContextPayload::Prompt { text, .. } => (Some(text.clone()), Vec::new()),
            ContextPayload::Chat(turns) => (None, turns.clone()),
        };
        self.store.append(NewMessage {
            id: Some(draft.id.clone()),
            created_at: Some(draft.created_at),
            memory_state: None,
            payload: TurnPayload::User {
                prompt: draft.prompt,
                context: Some(draft.context.display.clone()),
                full_text,
                turns,
            },
        });
        UserTurn {
            id: draft.id,
            context: draft.context,
        }
    }

    /// Drafts and immediately appends a user turn.
    pub fn add_user_message(&mut self, prompt: &str) -> Result<UserTurn, QuillError> {
        let draft = self.draft_user_message(prompt)?;
        Ok(self.commit_user_message(draft))
    }

    /// Appends a provider response and returns its stored id.
    pub fn add_assistant_message(&mut self, response: CompletionResponse) -> MessageId {
        self.store.append(NewMessage::assistant(response)).id.clone()
    }

    /// Appends a synthetic system record.
    pub fn add_system_message(&mut self, output: impl Into<String>) -> MessageId {
        self.store.append(NewMessage::system(output)).id.clone()
    }

    /// Appends an unrecognized payload, downgraded to a forgotten system
    /// record carrying its JSON text. Kept in the transcript for debugging
    /// but never sent to the model.
    pub fn add_raw_message(&mut self, value: serde_json::Value) -> MessageId {
        tracing::warn!(conversation = %self.id, "unrecognized message payload downgraded");
        self.store
            .append(NewMessage::system(value.to_string()).with_memory_state(MemoryState::Forgotten))
            .id
            .clone()
    }

    /// Shapes a built context into a provider request.
    pub fn completion_request(&self, built: &BuiltContext, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.model.model.to_string(),
            payload: match &built.payload {
                ContextPayload::Chat(turns) => RequestPayload::Chat(turns.clone()),
                ContextPayload::Prompt { text, stop } => RequestPayload::Prompt {
                    text: text.clone(),
                    stop: stop.clone(),
                },
            },
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            frequency_penalty: self.settings.frequency_penalty,
            presence_penalty: self.settings.presence_penalty,
            max_tokens: built.response_budget,
            stream,
        }
    }
}
