// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the OpenAI chat and legacy completion endpoints.

use quill_core::types::{ChatTurn, CompletionRequest, TokenUsage};
use serde::{Deserialize, Serialize};

/// OpenAI caps the number of stop sequences per request.
const MAX_STOP_SEQUENCES: usize = 4;

/// One role-tagged message of a chat request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ApiChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

impl ChatRequest {
    pub fn from_core(request: &CompletionRequest, turns: &[ChatTurn]) -> Self {
        Self {
            model: request.model.clone(),
            messages: turns
                .iter()
                .map(|t| ApiChatMessage {
                    role: t.role.to_string(),
                    content: t.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            max_tokens: request.max_tokens,
            stream: request.stream,
        }
    }
}

/// Request body for the legacy `POST /completions`.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl PromptRequest {
    pub fn from_core(request: &CompletionRequest, text: &str, stop: &[String]) -> Self {
        Self {
            model: request.model.clone(),
            prompt: text.to_string(),
            temperature: request.temperature,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            max_tokens: request.max_tokens,
            stream: request.stream,
            stop: stop.iter().take(MAX_STOP_SEQUENCES).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<ApiUsage> for TokenUsage {
    fn from(usage: ApiUsage) -> Self {
        TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ApiChatMessage,
    pub finish_reason: Option<String>,
}

/// Response body of `POST /chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptChoice {
    pub text: String,
    pub finish_reason: Option<String>,
}

/// Response body of the legacy `POST /completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<PromptChoice>,
    pub usage: Option<ApiUsage>,
}

/// One streamed chunk of a chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    pub choices: Vec<ChatChunkChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunkChoice {
    pub delta: ChatDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// One streamed chunk of a legacy completion.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptChunk {
    pub choices: Vec<PromptChunkChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptChunkChoice {
    pub text: String,
    pub finish_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::types::{RequestPayload, Role};

    fn core_request(stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            payload: RequestPayload::Chat(vec![ChatTurn {
                id: "m1".into(),
                role: Role::User,
                content: "Hi".into(),
                created_at: 1,
            }]),
            temperature: 0.7,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: 500,
            stream,
        }
    }

    #[test]
    fn chat_request_serializes_roles_lowercase() {
        let core = core_request(false);
        let RequestPayload::Chat(turns) = &core.payload else {
            unreachable!()
        };
        let body = serde_json::to_value(ChatRequest::from_core(&core, turns)).unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn prompt_request_truncates_stop_sequences() {
        let core = core_request(false);
        let stop: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let body = PromptRequest::from_core(&core, "text", &stop);
        assert_eq!(body.stop.len(), 4);
    }

    #[test]
    fn empty_stop_is_omitted_from_the_body() {
        let core = core_request(false);
        let body = serde_json::to_value(PromptRequest::from_core(&core, "text", &[])).unwrap();
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn error_envelope_deserializes() {
        let parsed: ApiErrorResponse = serde_json::from_str(
            r#"{"error":{"message":"Rate limited","type":"rate_limit_error"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.error.message, "Rate limited");
        assert_eq!(parsed.error.type_.as_deref(), Some("rate_limit_error"));
    }
}
