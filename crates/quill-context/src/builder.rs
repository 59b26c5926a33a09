// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context builder: turns a transcript plus a new user prompt into the
//! adapter-specific payload for the next request, with token accounting.
//!
//! Building is a pure function of the store contents and the builder's
//! parameters; calling it twice with the same inputs yields the same
//! context.

use quill_core::error::QuillError;
use quill_core::models::{AdapterKind, ModelDefinition};
use quill_core::tokens;
use quill_core::types::ChatTurn;

use crate::chat;
use crate::flat;
use crate::selection::select_memories;
use crate::store::MessageStore;

/// Conversation-level knobs the builder needs.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub user_handle: String,
    pub bot_handle: String,
    /// Memory cap for non-core messages; 0 means unlimited.
    pub max_memory_count: usize,
    /// Requested response token allowance, clamped to what the model's
    /// ceiling leaves after the prompt.
    pub response_tokens: u32,
}

/// The user turn being sent, identified before append so the rendered turn
/// list and the stored message agree on ids.
#[derive(Debug, Clone, Copy)]
pub struct NewTurn<'a> {
    pub id: &'a str,
    pub prompt: &'a str,
    pub created_at: i64,
}

/// Adapter-specific request body produced by a build.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextPayload {
    /// Role-tagged turn list for chat-style models.
    Chat(Vec<ChatTurn>),
    /// Flat prompt plus stop sequences for completion-style models.
    Prompt { text: String, stop: Vec<String> },
}

/// A fully built context, ready to become a request.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltContext {
    pub payload: ContextPayload,
    /// Plain rendered view, attached to the user message for inspection.
    pub display: String,
    /// Tokens the outgoing prompt consumes under the model's tokenizer.
    pub prompt_tokens: usize,
    /// Response allowance: `min(configured, ceiling - prompt)`, at least 1.
    pub response_budget: u32,
}

/// Builds contexts for one conversation against one model.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    model: &'static ModelDefinition,
    preamble: String,
    started_at: i64,
    settings: BuildSettings,
}

impl ContextBuilder {
    pub fn new(
        model: &'static ModelDefinition,
        preamble: impl Into<String>,
        started_at: i64,
        settings: BuildSettings,
    ) -> Self {
        Self {
            model,
            preamble: preamble.into(),
            started_at,
            settings,
        }
    }

    pub fn model(&self) -> &'static ModelDefinition {
        self.model
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn set_preamble(&mut self, preamble: impl Into<String>) {
        self.preamble = preamble.into();
    }

    pub fn settings_mut(&mut self) -> &mut BuildSettings {
        &mut self.settings
    }

    /// Builds the context for `new_turn` against the current store contents.
    ///
    /// Errors with [`QuillError::ContextTooLarge`] when the prompt alone
    /// meets or exceeds the model's token ceiling, leaving no room for a
    /// response.
    pub fn build(&self, store: &MessageStore, new_turn: NewTurn<'_>) -> Result<BuiltContext, QuillError> {
        let selected = select_memories(store.messages(), self.settings.max_memory_count);

        let display = flat::render_display(
            &self.preamble,
            &selected,
            new_turn.prompt,
            &self.settings.user_handle,
            &self.settings.bot_handle,
        );

        let (payload, prompt_tokens) = match self.model.adapter {
            AdapterKind::Chat => {
                let turns = chat::render_turns(
                    &self.preamble,
                    self.started_at,
                    &selected,
                    new_turn.id,
                    new_turn.prompt,
                    new_turn.created_at,
                );
                let counted: String = turns
                    .iter()
                    .map(|t| format!("{}\n{}", t.role, t.content))
                    .collect::<Vec<_>>()
                    .join("\n");
                let prompt_tokens = tokens::count(&counted, self.model.token_family);
                (ContextPayload::Chat(turns), prompt_tokens)
            }
            AdapterKind::Completion => {
                let prompt = flat::render_prompt(
                    self.model,
                    &self.preamble,
                    &selected,
                    new_turn.prompt,
                    &self.settings.user_handle,
                    &self.settings.bot_handle,
                );
                let prompt_tokens = tokens::count(&prompt.text, self.model.token_family);
                (
                    ContextPayload::Prompt {
                        text: prompt.text,
                        stop: prompt.stop,
                    },
                    prompt_tokens,
                )
            }
        };

        let ceiling = self.model.max_tokens;
        if prompt_tokens >= ceiling as usize {
            return Err(QuillError::ContextTooLarge {
                prompt_tokens,
                ceiling,
                model: self.model.model.to_string(),
            });
        }
        let remaining = ceiling - prompt_tokens as u32;
        let response_budget = self.settings.response_tokens.min(remaining).max(1);

        tracing::debug!(
            model = self.model.model,
            selected = selected.len(),
            prompt_tokens,
            response_budget,
            "context built"
        );

        Ok(BuiltContext {
            payload,
            display,
            prompt_tokens,
            response_budget,
        })
    }
}
