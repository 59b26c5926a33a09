// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat prompt rendering for completion-style models.
//!
//! Each entry is rendered as `<handle>\n<text>`, optionally wrapped in the
//! model's prompt delimiters, joined into one text block: preamble first,
//! then the selected history, then the new user turn, then a bot-handle stub
//! that positions the model to speak next.

use std::sync::LazyLock;

use quill_core::models::ModelDefinition;
use quill_core::types::{Message, Role};
use regex::Regex;

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid blank-run pattern"));

/// A rendered flat prompt plus the stop sequences to send with it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPrompt {
    pub text: String,
    pub stop: Vec<String>,
}

/// Collapses runs of blank lines into single newlines and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    BLANK_RUNS.replace_all(text.trim(), "\n").into_owned()
}

/// Stop sequences for a model: its own stop words merged with the
/// conversation handles, deduplicated.
pub fn stop_sequences(model: &ModelDefinition, user_handle: &str, bot_handle: &str) -> Vec<String> {
    let mut stop: Vec<String> = model.stop_words.iter().map(|s| (*s).to_string()).collect();
    for handle in [user_handle, bot_handle] {
        if !stop.iter().any(|s| s == handle) {
            stop.push(handle.to_string());
        }
    }
    stop
}

fn wrap(model: &ModelDefinition, body: &str) -> String {
    let start = model.prompt_start.unwrap_or("");
    let stop = model.prompt_stop.unwrap_or("");
    format!("{start}{body}{stop}")
}

fn handle_for(role: Role, user_handle: &str, bot_handle: &str) -> String {
    match role {
        Role::User => user_handle.to_string(),
        _ => bot_handle.to_string(),
    }
}

/// Renders the full outgoing prompt for a completion-style request.
pub fn render_prompt(
    model: &ModelDefinition,
    preamble: &str,
    history: &[&Message],
    new_prompt: &str,
    user_handle: &str,
    bot_handle: &str,
) -> FlatPrompt {
    let mut pieces = Vec::with_capacity(history.len() + 3);

    if !preamble.trim().is_empty() {
        pieces.push(wrap(model, preamble.trim()));
    }

    for message in history {
        let handle = handle_for(message.role(), user_handle, bot_handle);
        pieces.push(wrap(model, &format!("{handle}\n{}", message.content())));
    }

    pieces.push(wrap(model, &format!("{user_handle}\n{new_prompt}")));

    // The stub opens the assistant's turn; no stop delimiter so generation
    // continues until the model emits one itself.
    let mut stub = String::new();
    if let Some(start) = model.prompt_start {
        stub.push_str(start);
    }
    stub.push_str(bot_handle);
    pieces.push(stub);

    FlatPrompt {
        text: normalize_whitespace(&pieces.join("\n")),
        stop: stop_sequences(model, user_handle, bot_handle),
    }
}

/// Renders the context as a plain display view: no delimiters, no trailing
/// stub. Attached to user messages for inspection.
pub fn render_display(
    preamble: &str,
    history: &[&Message],
    new_prompt: &str,
    user_handle: &str,
    bot_handle: &str,
) -> String {
    let mut pieces = Vec::with_capacity(history.len() + 2);

    if !preamble.trim().is_empty() {
        pieces.push(preamble.trim().to_string());
    }
    for message in history {
        let handle = handle_for(message.role(), user_handle, bot_handle);
        pieces.push(format!("{handle}\n{}", message.content()));
    }
    pieces.push(format!("{user_handle}\n{new_prompt}"));

    normalize_whitespace(&pieces.join("\n"))
}
