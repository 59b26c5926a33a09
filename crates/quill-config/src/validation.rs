// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as parameter ranges and model registry membership.

use crate::diagnostic::ConfigError;
use crate::model::QuillConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &QuillConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if quill_core::models::lookup(&config.openai.default_model).is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "openai.default_model `{}` is not a supported model",
                config.openai.default_model
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.chat.temperature) {
        errors.push(ConfigError::Validation {
            message: format!(
                "chat.temperature must be within 0..=1, got {}",
                config.chat.temperature
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.chat.top_p) {
        errors.push(ConfigError::Validation {
            message: format!("chat.top_p must be within 0..=1, got {}", config.chat.top_p),
        });
    }

    for (key, value) in [
        ("chat.frequency_penalty", config.chat.frequency_penalty),
        ("chat.presence_penalty", config.chat.presence_penalty),
    ] {
        if !(-2.0..=2.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be within -2..=2, got {value}"),
            });
        }
    }

    if config.chat.response_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.response_tokens must be at least 1".to_string(),
        });
    }

    if config.chat.user_handle.trim().is_empty() || config.chat.bot_handle.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "chat.user_handle and chat.bot_handle must not be empty".to_string(),
        });
    }

    if config.history.directory.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "history.directory must not be empty".to_string(),
        });
    }

    if config.registry.max_conversations == 0 {
        errors.push(ConfigError::Validation {
            message: "registry.max_conversations must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
