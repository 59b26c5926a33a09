// SPDX-FileCopyrightText: 2026 Quill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI completion endpoints.
//!
//! Provides [`OpenAiClient`] which handles request construction,
//! authentication, endpoint selection (chat vs. legacy completion),
//! streaming SSE responses, and transient error retry.

use std::time::Duration;

use quill_core::traits::ChunkStream;
use quill_core::types::{CompletionRequest, CompletionResponse, RequestPayload};
use quill_core::QuillError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse, PromptRequest, PromptResponse};

/// Base URL for the OpenAI API.
const API_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP client for OpenAI API communication.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 500, 503, 529).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a new OpenAI API client authenticating with `api_key`.
    pub fn new(api_key: &str) -> Result<Self, QuillError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            QuillError::Config(format!("invalid API key header value: {e}"))
        })?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| QuillError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a non-streaming request and returns the normalized response.
    pub async fn complete(
        &self,
        mut request: CompletionRequest,
    ) -> Result<CompletionResponse, QuillError> {
        request.stream = false;
        let (url, body) = encode(&self.base_url, &request)?;
        let response = self.post_with_retry(&url, &body).await?;

        let text = response.text().await.map_err(|e| QuillError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let raw: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| QuillError::Provider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        match request.payload {
            RequestPayload::Chat(_) => normalize_chat(raw),
            RequestPayload::Prompt { .. } => normalize_prompt(raw),
        }
    }

    /// Sends a streaming request and returns the chunk stream.
    pub async fn stream(&self, mut request: CompletionRequest) -> Result<ChunkStream, QuillError> {
        request.stream = true;
        let is_chat = matches!(request.payload, RequestPayload::Chat(_));
        let (url, body) = encode(&self.base_url, &request)?;
        let response = self.post_with_retry(&url, &body).await?;

        Ok(if is_chat {
            sse::parse_chat_stream(response)
        } else {
            sse::parse_completion_stream(response)
        })
    }

    /// Posts `body` to `url`, retrying once after a 1-second delay on
    /// transient errors.
    async fn post_with_retry(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, QuillError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| QuillError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "response received");

            if status.is_success() {
                return Ok(response);
            }

            let body_text = response.text().await.unwrap_or_default();

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body_text, "transient error, will retry");
                last_error = Some(QuillError::Provider {
                    message: format!("API returned {status}: {body_text}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let message = match serde_json::from_str::<ApiErrorResponse>(&body_text) {
                Ok(api_err) => format!(
                    "OpenAI API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body_text}"),
            };
            return Err(QuillError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| QuillError::Provider {
            message: "request failed after retries".into(),
            source: None,
        }))
    }
}

/// Picks the endpoint and builds the wire body for a request.
fn encode(
    base_url: &str,
    request: &CompletionRequest,
) -> Result<(String, serde_json::Value), QuillError> {
    match &request.payload {
        RequestPayload::Chat(turns) => {
            let body = serde_json::to_value(ChatRequest::from_core(request, turns))
                .map_err(|e| QuillError::Internal(format!("failed to encode request: {e}")))?;
            Ok((format!("{base_url}/chat/completions"), body))
        }
        RequestPayload::Prompt { text, stop } => {
            let body = serde_json::to_value(PromptRequest::from_core(request, text, stop))
                .map_err(|e| QuillError::Internal(format!("failed to encode request: {e}")))?;
            Ok((format!("{base_url}/completions"), body))
        }
    }
}

fn normalize_chat(raw: serde_json::Value) -> Result<CompletionResponse, QuillError> {
    let parsed: ChatResponse =
        serde_json::from_value(raw.clone()).map_err(|e| QuillError::Provider {
            message: format!("failed to parse chat response: {e}"),
            source: Some(Box::new(e)),
        })?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| QuillError::Provider {
            message: "response contained no choices".into(),
            source: None,
        })?;
    Ok(CompletionResponse {
        id: parsed.id,
        model: parsed.model,
        content: choice.message.content,
        finish_reason: choice.finish_reason,
        usage: parsed.usage.map(Into::into),
        raw,
    })
}

fn normalize_prompt(raw: serde_json::Value) -> Result<CompletionResponse, QuillError> {
    let parsed: PromptResponse =
        serde_json::from_value(raw.clone()).map_err(|e| QuillError::Provider {
            message: format!("failed to parse completion response: {e}"),
            source: Some(Box::new(e)),
        })?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| QuillError::Provider {
            message: "response contained no choices".into(),
            source: None,
        })?;
    Ok(CompletionResponse {
        id: parsed.id,
        model: parsed.model,
        content: choice.text,
        finish_reason: choice.finish_reason,
        usage: parsed.usage.map(Into::into),
        raw,
    })
}

/// Returns true for HTTP status codes worth a single retry.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
