// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Quill configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuillConfig {
    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Per-conversation chat defaults.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Conversation history persistence settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Conversation registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model for new conversations.
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
        }
    }
}

fn default_model() -> String {
    quill_core::DEFAULT_MODEL.to_string()
}

/// Default sampling and context settings applied to new conversations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Sampling temperature (0–1).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Response token budget requested from the model.
    #[serde(default = "default_response_tokens")]
    pub response_tokens: u32,

    /// Nucleus sampling parameter.
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default)]
    pub frequency_penalty: f32,

    #[serde(default)]
    pub presence_penalty: f32,

    /// Cap on non-core memories included in context. 0 means unlimited.
    #[serde(default)]
    pub max_memory_count: usize,

    /// Display handle prefixing user turns in flat-prompt rendering.
    #[serde(default = "default_user_handle")]
    pub user_handle: String,

    /// Display handle prefixing assistant turns in flat-prompt rendering.
    #[serde(default = "default_bot_handle")]
    pub bot_handle: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            response_tokens: default_response_tokens(),
            top_p: default_top_p(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_memory_count: 0,
            user_handle: default_user_handle(),
            bot_handle: default_bot_handle(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_response_tokens() -> u32 {
    500
}

fn default_top_p() -> f32 {
    1.0
}

fn default_user_handle() -> String {
    "You:".to_string()
}

fn default_bot_handle() -> String {
    "Bot:".to_string()
}

/// Conversation history persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Whether transcripts are autosaved in the background.
    #[serde(default)]
    pub autosave: bool,

    /// Vault-relative directory for transcript files.
    #[serde(default = "default_history_directory")]
    pub directory: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            autosave: false,
            directory: default_history_directory(),
        }
    }
}

fn default_history_directory() -> String {
    "Quill/History".to_string()
}

/// Conversation registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Maximum conversations held in memory before LRU eviction.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
        }
    }
}

fn default_max_conversations() -> usize {
    32
}
