// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Quill conversation engine.

use thiserror::Error;

/// The primary error type used across all Quill crates.
#[derive(Debug, Error)]
pub enum QuillError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote completion provider errors (HTTP failure, API-level errors,
    /// malformed responses).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Vault persistence errors (directory creation, file writes).
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The assembled prompt alone fills or exceeds the model's token ceiling.
    ///
    /// Core memories are never silently dropped to make a request fit, so
    /// the send fails with this distinguishable error instead.
    #[error("context too large: prompt is {prompt_tokens} tokens against a {ceiling}-token ceiling for {model}")]
    ContextTooLarge {
        prompt_tokens: usize,
        ceiling: u32,
        model: String,
    },

    /// A send was attempted while another send for the same conversation
    /// is still in flight.
    #[error("a send is already in flight for conversation {conversation}")]
    SendInFlight { conversation: String },

    /// The requested model id is not in the supported model registry.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
