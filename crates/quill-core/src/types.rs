// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Quill workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The speaker of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Classification of a message controlling its inclusion in future context.
///
/// - `Core` memories are always sent, regardless of the memory cap.
/// - `Remembered` memories fill the cap before `Default` ones.
/// - `Forgotten` and `System` messages stay in the transcript but are
///   never part of the built context.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemoryState {
    Default,
    Core,
    Remembered,
    Forgotten,
    System,
}

/// Token usage reported by the remote completion API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A completion returned by a provider, normalized to its first choice.
///
/// `content` is the extracted first-choice text; `raw` retains the full
/// provider envelope for the transcript raw-data dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// One role-tagged entry of a chat-style request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: i64,
}

/// The content of one stored conversation turn.
///
/// Exhaustive sum over the shapes a message can take, so every consumption
/// site (context builder, transcript renderer, session) matches on the
/// variant instead of inspecting a runtime type string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnPayload {
    /// A user-authored prompt, plus the context artifacts computed when it
    /// was appended: the rendered display view, the flat outgoing prompt
    /// (completion-style models), and the chat turn list (chat-style models).
    User {
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        full_text: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        turns: Vec<ChatTurn>,
    },
    /// A provider completion.
    Assistant { response: CompletionResponse },
    /// A synthetic record: send errors, or unrecognized payloads downgraded
    /// to their JSON text.
    System { output: String },
}

/// One turn in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Seconds since the unix epoch, assigned at append time.
    pub created_at: i64,
    pub memory_state: MemoryState,
    #[serde(flatten)]
    pub payload: TurnPayload,
}

impl Message {
    /// The role implied by the payload variant.
    pub fn role(&self) -> Role {
        match self.payload {
            TurnPayload::User { .. } => Role::User,
            TurnPayload::Assistant { .. } => Role::Assistant,
            TurnPayload::System { .. } => Role::System,
        }
    }

    /// The display text of this turn (first-choice text for completions).
    pub fn content(&self) -> &str {
        match &self.payload {
            TurnPayload::User { prompt, .. } => prompt,
            TurnPayload::Assistant { response } => &response.content,
            TurnPayload::System { output } => output,
        }
    }
}

/// The adapter-specific body of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestPayload {
    /// Role-tagged turn list for chat-style models.
    Chat(Vec<ChatTurn>),
    /// Flat prompt text plus stop sequences for completion-style models.
    Prompt { text: String, stop: Vec<String> },
}

/// A request to the remote completion interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub payload: RequestPayload,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// A single chunk of a streaming completion response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionChunk {
    /// Incremental text, when the chunk carries content.
    pub text: Option<String>,
    /// The stop signal; a non-`None` value finalizes the response.
    pub finish_reason: Option<String>,
    /// Usage totals, when the provider reports them mid-stream.
    pub usage: Option<TokenUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn memory_state_round_trips_through_strum() {
        for state in [
            MemoryState::Default,
            MemoryState::Core,
            MemoryState::Remembered,
            MemoryState::Forgotten,
            MemoryState::System,
        ] {
            let s = state.to_string();
            assert_eq!(MemoryState::from_str(&s).unwrap(), state);
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn message_role_follows_payload() {
        let msg = Message {
            id: MessageId("m1".into()),
            created_at: 0,
            memory_state: MemoryState::Default,
            payload: TurnPayload::User {
                prompt: "hello".into(),
                context: None,
                full_text: None,
                turns: Vec::new(),
            },
        };
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.content(), "hello");
    }

    #[test]
    fn assistant_content_is_first_choice_text() {
        let msg = Message {
            id: MessageId("m2".into()),
            created_at: 1,
            memory_state: MemoryState::Default,
            payload: TurnPayload::Assistant {
                response: CompletionResponse {
                    id: "cmpl-1".into(),
                    model: "gpt-3.5-turbo".into(),
                    content: "hi there".into(),
                    finish_reason: Some("stop".into()),
                    usage: None,
                    raw: serde_json::Value::Null,
                },
            },
        };
        assert_eq!(msg.role(), Role::Assistant);
        assert_eq!(msg.content(), "hi there");
    }

    #[test]
    fn payload_serialization_is_tagged() {
        let payload = TurnPayload::System {
            output: "error: timeout".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "system");
        assert_eq!(json["output"], "error: timeout");
    }
}
