// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Markdown transcript rendering and vault persistence.
//!
//! A transcript file has three sections under a YAML front matter block: the
//! preamble, a human-readable summary of the exchange as quote blocks, and a
//! raw JSON dump of every stored message with token counts.

use std::sync::LazyLock;

use quill_core::tokens;
use quill_core::types::{MemoryState, Role};
use quill_core::{QuillError, VaultStore};
use regex::Regex;

use crate::conversation::{Conversation, DEFAULT_TITLE};

static UNSAFE_TITLE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\\/:]").expect("valid title pattern"));

/// What a save attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { path: String },
    /// The conversation still carries the sentinel title; rename first.
    SkippedDefaultTitle,
    /// A different save already owns this path and overwrite was off.
    SkippedExisting { path: String },
}

/// Replaces path-hostile characters in a title with underscores.
pub fn sanitize_title(title: &str) -> String {
    UNSAFE_TITLE_CHARS.replace_all(title, "_").into_owned()
}

/// Renders and writes a conversation transcript into the vault.
///
/// Conversations still titled [`DEFAULT_TITLE`] are not saved. With
/// `overwrite` off, an existing file at the target path aborts the save.
pub async fn save_conversation(
    vault: &dyn VaultStore,
    conversation: &Conversation,
    directory: &str,
    overwrite: bool,
) -> Result<SaveOutcome, QuillError> {
    if conversation.title() == DEFAULT_TITLE {
        tracing::debug!(conversation = %conversation.id(), "unnamed conversation; save skipped");
        return Ok(SaveOutcome::SkippedDefaultTitle);
    }

    vault.create_directory(directory).await?;
    let path = format!("{directory}/{}.md", sanitize_title(conversation.title()));

    if !overwrite && vault.file_exists(&path).await? {
        tracing::debug!(path, "transcript already exists; save skipped");
        return Ok(SaveOutcome::SkippedExisting { path });
    }

    let body = render_transcript(conversation)?;
    vault.write_file(&path, &body).await?;
    tracing::info!(conversation = %conversation.id(), path, "transcript saved");
    Ok(SaveOutcome::Saved { path })
}

/// Renders the full Markdown transcript for a conversation.
pub fn render_transcript(conversation: &Conversation) -> Result<String, QuillError> {
    let model = conversation.model();
    let datetime = chrono::DateTime::from_timestamp(conversation.created_at(), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default();

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("conversationId: {}\n", conversation.id()));
    out.push_str(&format!("model: {}\n", model.model));
    out.push_str(&format!("adapter: {}\n", model.adapter));
    out.push_str(&format!("timestamp: {}\n", conversation.created_at()));
    out.push_str(&format!("datetime: {datetime}\n"));
    out.push_str("---\n\n");

    out.push_str("## Preamble\n\n");
    if conversation.preamble().trim().is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(conversation.preamble().trim());
        out.push('\n');
    }
    out.push('\n');

    out.push_str("## Summary\n\n");
    let settings = conversation.settings();
    for message in conversation.store().iter() {
        let speaker = match message.role() {
            Role::User => settings.user_handle.as_str(),
            Role::Assistant => settings.bot_handle.as_str(),
            Role::System => "System:",
        };
        let annotation = match message.memory_state {
            MemoryState::Core => " *(core memory)*",
            MemoryState::Remembered => " *(remembered)*",
            MemoryState::Forgotten => " *(forgotten)*",
            MemoryState::Default | MemoryState::System => "",
        };
        // Continuation lines stay inside the quote block.
        let content = message.content().replace('\n', "\n> ");
        out.push_str(&format!("> **{speaker}**{annotation} {content}\n>\n"));
    }
    out.push('\n');

    out.push_str("## Raw Data\n\n```json\n");
    out.push_str(&raw_data(conversation)?);
    out.push_str("\n```\n");

    Ok(out)
}

fn raw_data(conversation: &Conversation) -> Result<String, QuillError> {
    let family = conversation.model().token_family;
    let mut total_tokens = 0usize;
    let mut messages = Vec::with_capacity(conversation.store().len());

    for message in conversation.store().iter() {
        let token_count = tokens::count(message.content(), family);
        total_tokens += token_count;
        let mut value = serde_json::to_value(message).map_err(|e| {
            QuillError::Internal(format!("failed to serialize message: {e}"))
        })?;
        value["token_count"] = serde_json::Value::from(token_count);
        messages.push(value);
    }

    let raw = serde_json::json!({
        "conversationId": conversation.id().0,
        "title": conversation.title(),
        "model": conversation.model().model,
        "createdAt": conversation.created_at(),
        "totalTokens": total_tokens,
        "messages": messages,
    });
    serde_json::to_string_pretty(&raw)
        .map_err(|e| QuillError::Internal(format!("failed to render raw data: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationSettings;
    use crate::testutil::MemoryVault;
    use quill_core::types::{CompletionResponse, MemoryState};

    fn named_conversation(title: &str) -> Conversation {
        let mut convo =
            Conversation::with_model_id("gpt-3.5-turbo", ConversationSettings::default()).unwrap();
        convo.set_title(title);
        convo
    }

    fn response(content: &str) -> CompletionResponse {
        CompletionResponse {
            id: "cmpl-1".into(),
            model: "gpt-3.5-turbo".into(),
            content: content.into(),
            finish_reason: Some("stop".into()),
            usage: None,
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn sanitize_replaces_path_characters() {
        assert_eq!(sanitize_title("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_title("plain title"), "plain title");
    }

    #[tokio::test]
    async fn unnamed_conversations_are_not_saved() {
        let vault = MemoryVault::default();
        let convo =
            Conversation::with_model_id("gpt-3.5-turbo", ConversationSettings::default()).unwrap();
        let outcome = save_conversation(&vault, &convo, "Quill/History", false)
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::SkippedDefaultTitle);
        assert!(vault.files().is_empty());
    }

    #[tokio::test]
    async fn existing_files_abort_without_overwrite() {
        let vault = MemoryVault::default();
        let convo = named_conversation("Trip");
        vault.seed("Quill/History/Trip.md", "older");

        let outcome = save_conversation(&vault, &convo, "Quill/History", false)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::SkippedExisting {
                path: "Quill/History/Trip.md".into()
            }
        );
        assert_eq!(vault.read("Quill/History/Trip.md").as_deref(), Some("older"));
    }

    #[tokio::test]
    async fn overwrite_replaces_the_existing_transcript() {
        let vault = MemoryVault::default();
        let convo = named_conversation("Trip");
        vault.seed("Quill/History/Trip.md", "older");

        let outcome = save_conversation(&vault, &convo, "Quill/History", true)
            .await
            .unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved { .. }));
        assert!(vault
            .read("Quill/History/Trip.md")
            .unwrap()
            .contains("## Summary"));
        assert!(vault.directories().contains("Quill/History"));
    }

    #[test]
    fn transcript_carries_front_matter_summary_and_raw_data() {
        let mut convo = named_conversation("Trip: day/one");
        convo.set_preamble("Be helpful.");
        let turn = convo.add_user_message("Where\nto?").unwrap();
        convo.set_memory_state(&turn.id, MemoryState::Core);
        convo.add_assistant_message(response("Lisbon."));

        let body = render_transcript(&convo).unwrap();
        assert!(body.starts_with("---\n"));
        assert!(body.contains(&format!("conversationId: {}", convo.id())));
        assert!(body.contains("model: gpt-3.5-turbo"));
        assert!(body.contains("adapter: chat"));
        assert!(body.contains("## Preamble\n\nBe helpful."));
        // Multi-line user content stays inside the quote block, annotated.
        assert!(body.contains("> **You:** *(core memory)* Where\n> to?"));
        assert!(body.contains("> **Bot:** Lisbon."));
        assert!(body.contains("\"totalTokens\""));
        assert!(body.contains("\"token_count\""));
    }

    #[test]
    fn empty_preamble_renders_a_placeholder() {
        let convo = named_conversation("Trip");
        let body = render_transcript(&convo).unwrap();
        assert!(body.contains("## Preamble\n\n(none)"));
    }
}
