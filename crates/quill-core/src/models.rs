// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static registry of supported model definitions.
//!
//! Each definition records the adapter style (chat vs. legacy completion),
//! the model's token ceiling, the tokenizer family used for counting, and
//! any prompt delimiters the completion-style models expect.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::QuillError;

/// Whether a model consumes a flat text prompt or a role-tagged turn list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Chat,
    Completion,
}

/// The tokenizer generation a model's counts must track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFamily {
    /// GPT-3-generation encoding (davinci-era models).
    Gpt3,
    /// GPT-4-generation encoding (gpt-3.5-turbo and later).
    Gpt4,
}

/// Static descriptor of one supported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDefinition {
    /// Human-readable display name.
    pub name: &'static str,
    /// API model identifier.
    pub model: &'static str,
    pub adapter: AdapterKind,
    /// Token ceiling shared by prompt and response.
    pub max_tokens: u32,
    pub token_family: TokenFamily,
    /// Delimiter prepended to each rendered entry (completion-style only).
    pub prompt_start: Option<&'static str>,
    /// Delimiter appended to each rendered entry (completion-style only).
    pub prompt_stop: Option<&'static str>,
    /// Model-specific stop sequences, merged with the conversation handles.
    pub stop_words: &'static [&'static str],
}

/// Model id used when a conversation does not name one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// All models Quill knows how to drive.
pub const SUPPORTED_MODELS: &[ModelDefinition] = &[
    ModelDefinition {
        name: "GPT-3.5 Turbo",
        model: "gpt-3.5-turbo",
        adapter: AdapterKind::Chat,
        max_tokens: 4097,
        token_family: TokenFamily::Gpt4,
        prompt_start: None,
        prompt_stop: None,
        stop_words: &[],
    },
    ModelDefinition {
        name: "GPT-3.5 Turbo 16k",
        model: "gpt-3.5-turbo-16k",
        adapter: AdapterKind::Chat,
        max_tokens: 16385,
        token_family: TokenFamily::Gpt4,
        prompt_start: None,
        prompt_stop: None,
        stop_words: &[],
    },
    ModelDefinition {
        name: "GPT-4",
        model: "gpt-4",
        adapter: AdapterKind::Chat,
        max_tokens: 8192,
        token_family: TokenFamily::Gpt4,
        prompt_start: None,
        prompt_stop: None,
        stop_words: &[],
    },
    ModelDefinition {
        name: "GPT-4 32k",
        model: "gpt-4-32k",
        adapter: AdapterKind::Chat,
        max_tokens: 32768,
        token_family: TokenFamily::Gpt4,
        prompt_start: None,
        prompt_stop: None,
        stop_words: &[],
    },
    ModelDefinition {
        name: "GPT-3.5 Turbo Instruct",
        model: "gpt-3.5-turbo-instruct",
        adapter: AdapterKind::Completion,
        max_tokens: 4097,
        token_family: TokenFamily::Gpt4,
        prompt_start: None,
        prompt_stop: None,
        stop_words: &[],
    },
    ModelDefinition {
        name: "Text Davinci 003",
        model: "text-davinci-003",
        adapter: AdapterKind::Completion,
        max_tokens: 4000,
        token_family: TokenFamily::Gpt3,
        prompt_start: Some("<[im_start]>"),
        prompt_stop: Some("<[im_stop]>"),
        stop_words: &["<[im_stop]>"],
    },
    ModelDefinition {
        name: "Code Davinci 002",
        model: "code-davinci-002",
        adapter: AdapterKind::Completion,
        max_tokens: 8001,
        token_family: TokenFamily::Gpt3,
        prompt_start: Some("<[im_start]>"),
        prompt_stop: Some("<[im_stop]>"),
        stop_words: &["<[im_stop]>"],
    },
];

/// Looks up a model definition by API model id.
pub fn lookup(model: &str) -> Option<&'static ModelDefinition> {
    SUPPORTED_MODELS.iter().find(|m| m.model == model)
}

/// Looks up a model definition, erroring on unknown ids.
pub fn get(model: &str) -> Result<&'static ModelDefinition, QuillError> {
    lookup(model).ok_or_else(|| QuillError::UnknownModel(model.to_string()))
}
